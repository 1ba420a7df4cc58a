pub mod response;
pub mod service;

pub use response::{default_error_handler, not_found_handler, status_reason};
pub use service::{AppService, Configuration, HandlerRegistration, RouteRegistration};
