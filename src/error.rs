use std::fmt;

use http::Method;

/// Errors raised while registering routes or dispatching requests
///
/// Registration-time variants (`RouteConflict`, `CatchAllNotLast`, `EmptyParamName`,
/// `InvalidPattern`, `Registration`) abort service construction. `NotFound` is handed to the
/// not-found handler and never escapes the request path. `ParamsMissing` is returned to handlers
/// that ask for route parameters on a request no route matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Two patterns under the same method have the same structure
    RouteConflict {
        method: Method,
        /// The pattern registered first
        existing: String,
        /// The pattern that collided with it
        pattern: String,
    },
    /// A catch-all segment was followed by further segments
    CatchAllNotLast { pattern: String },
    /// A `:` or `*` marker with no name after it
    EmptyParamName { pattern: String },
    /// A marker that does not start a segment, e.g. `/user:id`
    InvalidPattern { pattern: String, reason: &'static str },
    /// A handler registration collaborator refused the service's error handler
    Registration { base_uri: String, reason: String },
    /// No route matched the request
    NotFound { method: Method, path: String },
    /// Route parameters were requested but the request was never routed
    ParamsMissing,
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::RouteConflict {
                method,
                existing,
                pattern,
            } => write!(
                f,
                "route conflict: {method} '{pattern}' collides with already registered '{existing}'"
            ),
            RouterError::CatchAllNotLast { pattern } => write!(
                f,
                "invalid route '{pattern}': catch-all segment must be the last segment"
            ),
            RouterError::EmptyParamName { pattern } => write!(
                f,
                "invalid route '{pattern}': parameter and catch-all segments need a name"
            ),
            RouterError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid route '{pattern}': {reason}")
            }
            RouterError::Registration { base_uri, reason } => write!(
                f,
                "handler registration for '{base_uri}' failed: {reason}"
            ),
            RouterError::NotFound { method, path } => {
                write!(f, "no handler found for {method} {path}")
            }
            RouterError::ParamsMissing => {
                write!(f, "request carries no route parameters (no route matched)")
            }
        }
    }
}

impl std::error::Error for RouterError {}
