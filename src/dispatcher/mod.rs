//! # Dispatcher Module
//!
//! Request and response types plus the [`Handler`] seam that the service
//! dispatches into.
//!
//! ## Handler Shapes
//!
//! Handlers are stored as `Arc<dyn Handler>` and built from one of a small set
//! of adapters, picked at registration time:
//!
//! | Adapter | Closure shape |
//! |---------|---------------|
//! | [`handler_fn`] | `Fn(&mut HandlerRequest, &mut HandlerResponse)` |
//! | [`responder_fn`] | `Fn(&HandlerRequest) -> HandlerResponse` |
//! | [`params_fn`] | `Fn(&Params, &HandlerRequest, &mut HandlerResponse)` |
//! | [`from_handler`] | any type implementing [`Handler`] |
//!
//! [`Params`]: crate::router::Params
//!
//! ## Request Context
//!
//! Route parameters travel in the request's `http::Extensions`, keyed by the
//! `Params` type, and are read back with [`HandlerRequest::params`]:
//!
//! ```rust
//! use restgate::dispatcher::{params_fn, HandlerResponse};
//!
//! let handler = params_fn(|params, _req, res: &mut HandlerResponse| {
//!     let id = params.get("id").unwrap_or_default().to_string();
//!     res.write_json(200, serde_json::json!({ "id": id }));
//! });
//! # let _ = handler;
//! ```

mod core;

pub use core::{
    from_handler, handler_fn, params_fn, parse_query, responder_fn, BoxedHandler, ErrorHandler,
    Handler, HandlerRequest, HandlerResponse, HasStatus, HeaderVec, MAX_INLINE_HEADERS,
};
