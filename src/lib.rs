//! # restgate
//!
//! **restgate** is an embeddable HTTP request router for REST gateways: a radix-tree route table
//! with named and catch-all parameters, composable middleware, and a per-service CORS engine.
//!
//! ## Overview
//!
//! restgate does not own a socket. A transport layer (any HTTP server) turns each incoming
//! request into a [`dispatcher::HandlerRequest`], calls [`server::AppService::serve`], and writes
//! the returned [`dispatcher::HandlerResponse`] back to the client. Everything in between is
//! synchronous and allocation-light, so the service can be shared across worker threads behind an
//! `Arc` without locking.
//!
//! ## Architecture
//!
//! - **[`router`]** - Radix trie per HTTP method with `:param` and `*catchall` segments
//! - **[`dispatcher`]** - Request/response types and the [`dispatcher::Handler`] seam
//! - **[`middleware`]** - Middleware chaining, CORS, tracing and metrics middleware
//! - **[`server`]** - [`server::AppService`]: CORS pre-stage, routing, not-found handling
//! - **[`config`]** - YAML/TOML service configuration with environment overrides
//! - **[`convert`]** - Typed conversion helpers for parameter strings
//! - **[`logging`]** - `tracing-subscriber` setup for binaries
//! - **[`cli`]** - The `restgate` inspection binary
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Transport
//!     participant Service as AppService
//!     participant Cors as CorsPolicy
//!     participant Router as Router
//!     participant Chain as Middleware Chain
//!     participant Handler
//!
//!     Transport->>Service: serve(&mut HandlerRequest)
//!     Service->>Service: request id, trim trailing slash
//!     alt CORS enabled
//!         Service->>Cors: apply(req, res)
//!         alt Preflight
//!             Cors-->>Transport: 200 + Access-Control-* headers
//!         end
//!     end
//!     Service->>Router: route(method, path)
//!     alt Matched
//!         Service->>Service: store Params in extensions
//!         Service->>Chain: serve (chain[0] outermost)
//!         Chain->>Handler: serve
//!         Handler-->>Transport: HandlerResponse
//!     else No match
//!         Service-->>Transport: not-found handler response
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use restgate::dispatcher::{handler_fn, HandlerRequest};
//! use restgate::server::{AppService, Configuration};
//!
//! let cfg = Configuration {
//!     base_uri: "/v1".to_string(),
//!     cors: true,
//!     ..Configuration::default()
//! };
//! let mut service = AppService::new(cfg, Vec::new()).unwrap();
//! service
//!     .get(
//!         "/users/:id",
//!         handler_fn(|req, res| {
//!             let id = req.path_param("id").unwrap_or_default().to_string();
//!             res.write_json(200, serde_json::json!({ "id": id }));
//!         }),
//!     )
//!     .unwrap();
//!
//! let mut req = HandlerRequest::new(Method::GET, "/v1/users/42/");
//! let res = service.serve(&mut req);
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body["id"], "42");
//! assert_eq!(res.get_header("Access-Control-Allow-Origin"), Some("*"));
//! ```
//!
//! ## Route Patterns
//!
//! | Pattern | Matches | Binds |
//! |---------|---------|-------|
//! | `/users` | `/users` | nothing |
//! | `/users/:id` | `/users/42` | `id = "42"` |
//! | `/files/*path` | `/files/a/b.txt` | `path = "a/b.txt"` |
//!
//! Static segments win over parameters, and parameters over catch-alls; the trie backtracks when
//! a preferred branch dead-ends. See [`router`] for the full rules.
//!
//! ## Middleware
//!
//! Middleware wraps handlers at registration time. For a chain `[a, b]` a request runs
//! `a` → `b` → handler → `b` → `a`:
//!
//! ```rust
//! use std::sync::Arc;
//! use restgate::middleware::{middleware_fn, Middleware, TracingMiddleware};
//!
//! let chain: Vec<Arc<dyn Middleware>> = vec![
//!     Arc::new(TracingMiddleware),
//!     middleware_fn(|next| next),
//! ];
//! # let _ = chain;
//! ```
//!
//! ## Logging
//!
//! All components log through `tracing`. Binaries install a subscriber with
//! [`logging::init_logging`], configured by `RESTGATE_LOG_*` environment variables.

pub mod cli;
pub mod config;
pub mod convert;
pub mod dispatcher;
mod echo;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod server;

pub use config::{load_config, ServiceConfig};
pub use dispatcher::{BoxedHandler, Handler, HandlerRequest, HandlerResponse};
pub use error::RouterError;
pub use ids::RequestId;
pub use middleware::{CorsOptions, CorsPolicy, Middleware};
pub use router::{Params, Router};
pub use server::{AppService, Configuration, HandlerRegistration, RouteRegistration};
