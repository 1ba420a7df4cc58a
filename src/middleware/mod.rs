//! # Middleware Module
//!
//! Cross-cutting request processing composed around handlers at registration
//! time. See [`wrap`] for the ordering rule.

mod core;
pub mod cors;
mod metrics;
mod tracing;

pub use core::{middleware_fn, wrap, Middleware};
pub use cors::{CorsConfigError, CorsMiddleware, CorsOptions, CorsOutcome, CorsPolicy, CorsPolicyBuilder};
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;
