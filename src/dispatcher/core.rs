//! Dispatcher core module - request/response types and the handler seam.
//!
//! Everything a handler touches lives here: the request it reads, the response
//! it writes, and the adapters that turn plain closures into [`Handler`]s.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::{Extensions, Method};
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RouterError;
use crate::ids::RequestId;
use crate::router::{ParamVec, Params};

/// Maximum inline headers before heap allocation
/// Most requests have ≤16 headers
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path
///
/// Header names use `Arc<str>` so that well-known names built once can be
/// cloned with an atomic increment. Values are per request.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Decode one query string component (`+` is a space)
fn decode_component(raw: &str) -> String {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced.into_owned(),
    }
}

/// Parse a raw query string into ordered (key, value) pairs
///
/// Pairs without `=` bind an empty value; empty pairs are skipped.
#[must_use]
pub fn parse_query(query: &str) -> ParamVec {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (Arc::from(decode_component(k)), decode_component(v))
        })
        .collect()
}

/// An incoming request as seen by middleware and handlers
///
/// The transport layer builds one per request; the service fills in the
/// request id and, on a successful match, the route [`Params`] extension.
#[derive(Debug)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Query string parameters, URL-decoded (stack-allocated for ≤8 params)
    pub query_params: ParamVec,
    /// HTTP headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
    /// Request-scoped values keyed by type
    pub extensions: Extensions,
}

impl HandlerRequest {
    /// Build a request from a method and a request target (`/path?query`)
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            query_params: parse_query(query),
            headers: HeaderVec::new(),
            body: None,
            extensions: Extensions::new(),
        }
    }

    /// Append a header (builder style)
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    /// Attach a JSON body (builder style)
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Route parameters bound by the service
    ///
    /// # Errors
    ///
    /// [`RouterError::ParamsMissing`] if the request was never routed.
    pub fn params(&self) -> Result<&Params, RouterError> {
        self.extensions
            .get::<Params>()
            .ok_or(RouterError::ParamsMissing)
    }

    /// Get a route parameter by name, `None` when unrouted or absent
    #[inline]
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.params().ok().and_then(|p| p.get(name))
    }

    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics: `?limit=10&limit=20` yields `20`.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert query_params to HashMap for compatibility
    /// Note: This allocates - use get_query_param() in hot paths
    #[must_use]
    pub fn query_params_map(&self) -> HashMap<String, String> {
        self.query_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Values that know which HTTP status they stand for
pub trait HasStatus {
    fn status(&self) -> u16;
}

impl HasStatus for RouterError {
    fn status(&self) -> u16 {
        match self {
            RouterError::NotFound { .. } => 404,
            _ => 500,
        }
    }
}

impl HasStatus for http::StatusCode {
    fn status(&self) -> u16 {
        self.as_u16()
    }
}

/// Response written by middleware and handlers
///
/// Starts as an empty `200`. The CORS stage may add headers before routing,
/// so handlers add to it rather than replace it.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body; a JSON string is sent as plain text
    pub body: Value,
}

impl Default for HandlerResponse {
    fn default() -> Self {
        Self::new(200, HeaderVec::new(), Value::Null)
    }
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut res = Self::default();
        res.write_json(status, body);
        res
    }

    /// Create a plain text response
    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        let mut res = Self::default();
        res.write_text(status, body);
        res
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Replace status and body with JSON, keeping headers already set
    pub fn write_json(&mut self, status: u16, body: Value) {
        self.status = status;
        self.body = body;
        self.set_header("content-type", "application/json".to_string());
    }

    /// Replace status and body with plain text, keeping headers already set
    pub fn write_text(&mut self, status: u16, body: &str) {
        self.status = status;
        self.body = Value::String(body.to_string());
        self.set_header("content-type", "text/plain; charset=utf-8".to_string());
    }

    /// Fold another response into this one: its status and body win, its
    /// headers are added on top of ours.
    pub fn merge(&mut self, other: HandlerResponse) {
        self.status = other.status;
        self.body = other.body;
        for (name, value) in other.headers {
            self.set_header(&name, value);
        }
    }

    /// The body as it goes on the wire
    #[must_use]
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A request handler
///
/// Handlers are shared between threads for the life of the service and are
/// called with exclusive access to the per-request state.
pub trait Handler: Send + Sync {
    fn serve(&self, req: &mut HandlerRequest, res: &mut HandlerResponse);
}

/// Shared handle to a handler, as stored in the route tables
pub type BoxedHandler = Arc<dyn Handler>;

/// Error callback used for not-found and handler errors
pub type ErrorHandler =
    Arc<dyn Fn(&mut HandlerResponse, &HandlerRequest, &dyn std::error::Error) + Send + Sync>;

struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut HandlerRequest, &mut HandlerResponse) + Send + Sync,
{
    fn serve(&self, req: &mut HandlerRequest, res: &mut HandlerResponse) {
        (self.0)(req, res);
    }
}

struct ResponderFn<F>(F);

impl<F> Handler for ResponderFn<F>
where
    F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync,
{
    fn serve(&self, req: &mut HandlerRequest, res: &mut HandlerResponse) {
        res.merge((self.0)(req));
    }
}

struct ParamsFn<F>(F);

impl<F> Handler for ParamsFn<F>
where
    F: Fn(&Params, &HandlerRequest, &mut HandlerResponse) + Send + Sync,
{
    fn serve(&self, req: &mut HandlerRequest, res: &mut HandlerResponse) {
        let req: &HandlerRequest = req;
        match req.params() {
            Ok(params) => (self.0)(params, req, res),
            Err(_) => (self.0)(&Params::default(), req, res),
        }
    }
}

/// Adapt a closure that writes into the response
pub fn handler_fn<F>(f: F) -> BoxedHandler
where
    F: Fn(&mut HandlerRequest, &mut HandlerResponse) + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// Adapt a closure that returns a fresh response
///
/// Headers already on the outgoing response (CORS, request id) are kept.
pub fn responder_fn<F>(f: F) -> BoxedHandler
where
    F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
{
    Arc::new(ResponderFn(f))
}

/// Adapt a closure that takes the route parameters up front
///
/// An unrouted request passes empty parameters.
pub fn params_fn<F>(f: F) -> BoxedHandler
where
    F: Fn(&Params, &HandlerRequest, &mut HandlerResponse) + Send + Sync + 'static,
{
    Arc::new(ParamsFn(f))
}

/// Share an existing [`Handler`] implementation
pub fn from_handler<H>(handler: H) -> BoxedHandler
where
    H: Handler + 'static,
{
    Arc::new(handler)
}
