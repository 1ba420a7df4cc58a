//! Cross-Origin Resource Sharing
//!
//! A [`CorsPolicy`] is compiled once from [`CorsOptions`] and then answers two
//! questions per request: which headers a simple (actual) request gets, and
//! which headers a preflight gets. The service runs it as a pre-stage before
//! routing; [`CorsMiddleware`] runs the same policy inside a middleware chain.
//!
//! # Origin Patterns
//!
//! Each allowed origin is matched as a whole. `*` matches any run of
//! characters and `?` exactly one; everything else is literal:
//!
//! | Entry | Allows | Rejects |
//! |-------|--------|---------|
//! | `https://*.cs.com` | `https://bar.cs.com` | `https://evil.com.cs.com.attacker.com` |
//! | `http://localhost:300?` | `http://localhost:3000` | `http://localhost:30000` |
//!
//! Patterns belong to the policy that compiled them; two policies never see
//! each other's origins.
//!
//! # Credentials
//!
//! `Access-Control-Allow-Credentials` is always sent for an allowed origin,
//! carrying the configured flag. Allow-all combined with credentials is
//! accepted and yields `*` with `true`; browsers will refuse credentialed
//! requests under that combination, so pair credentials with explicit origins.

mod builder;
mod error;

pub use builder::CorsPolicyBuilder;
pub use error::CorsConfigError;

use std::sync::Arc;

use http::Method;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dispatcher::{BoxedHandler, Handler, HandlerRequest, HandlerResponse, HeaderVec};
use crate::middleware::Middleware;

pub const HEADER_ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const HEADER_ALLOW_CREDENTIALS: &str = "Access-Control-Allow-Credentials";
pub const HEADER_ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const HEADER_ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
pub const HEADER_EXPOSE_HEADERS: &str = "Access-Control-Expose-Headers";
pub const HEADER_MAX_AGE: &str = "Access-Control-Max-Age";

pub const HEADER_ORIGIN: &str = "Origin";
pub const HEADER_REQUEST_METHOD: &str = "Access-Control-Request-Method";
pub const HEADER_REQUEST_HEADERS: &str = "Access-Control-Request-Headers";

/// Allow headers used when none are configured
pub const DEFAULT_ALLOW_HEADERS: [&str; 4] = ["Origin", "Accept", "Content-Type", "Authorization"];

/// Declarative CORS settings, as found in configuration files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsOptions {
    /// Allow every origin
    pub allow_all_origins: bool,
    /// Allowed origins; `*` and `?` are wildcards
    pub allow_origins: Vec<String>,
    /// Value of `Access-Control-Allow-Credentials`
    pub allow_credentials: bool,
    /// Allowed methods, sent in this order
    pub allow_methods: Vec<String>,
    /// Allowed request headers; empty means [`DEFAULT_ALLOW_HEADERS`]
    pub allow_headers: Vec<String>,
    /// Headers exposed to scripts
    pub expose_headers: Vec<String>,
    /// Preflight cache lifetime; `0` omits the header
    pub max_age_secs: u64,
}

impl CorsOptions {
    /// Options that allow every origin and nothing else
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            allow_all_origins: true,
            ..Self::default()
        }
    }
}

/// Turn one allowed-origin entry into an anchored regex
fn compile_origin(origin: &str) -> Result<Regex, CorsConfigError> {
    let pattern = regex::escape(origin)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    Regex::new(&format!("^{pattern}$")).map_err(|e| CorsConfigError::InvalidOriginPattern {
        origin: origin.to_string(),
        reason: e.to_string(),
    })
}

fn push(headers: &mut HeaderVec, name: &str, value: String) {
    headers.push((Arc::from(name), value));
}

/// What the CORS stage decided for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorsOutcome {
    /// Preflight answered; the response is complete and nothing is routed
    Preflight,
    /// Simple headers applied (if any); routing continues
    Continue,
}

/// A compiled CORS policy
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    options: CorsOptions,
    origin_patterns: Vec<Regex>,
}

impl CorsPolicy {
    /// Compile `options` into a policy
    ///
    /// Empty `allow_headers` are replaced with [`DEFAULT_ALLOW_HEADERS`].
    ///
    /// # Errors
    ///
    /// [`CorsConfigError::InvalidOriginPattern`] if an origin entry fails to compile.
    pub fn new(mut options: CorsOptions) -> Result<Self, CorsConfigError> {
        if options.allow_headers.is_empty() {
            options.allow_headers = DEFAULT_ALLOW_HEADERS.iter().map(|h| (*h).to_string()).collect();
        }
        let origin_patterns = options
            .allow_origins
            .iter()
            .map(|origin| compile_origin(origin))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            allow_all_origins = options.allow_all_origins,
            origin_patterns = origin_patterns.len(),
            allow_credentials = options.allow_credentials,
            "CORS policy compiled"
        );

        Ok(Self {
            options,
            origin_patterns,
        })
    }

    /// A policy allowing every origin
    #[must_use]
    pub fn allow_all() -> Self {
        let mut options = CorsOptions::allow_all();
        options.allow_headers = DEFAULT_ALLOW_HEADERS.iter().map(|h| (*h).to_string()).collect();
        Self {
            options,
            origin_patterns: Vec::new(),
        }
    }

    /// The options this policy was compiled from, defaults applied
    #[must_use]
    pub fn options(&self) -> &CorsOptions {
        &self.options
    }

    #[must_use]
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.options.allow_all_origins || self.origin_patterns.iter().any(|re| re.is_match(origin))
    }

    /// `Access-Control-Allow-Origin` value for an allowed origin
    fn allow_origin_value(&self, origin: &str) -> String {
        if self.options.allow_all_origins {
            "*".to_string()
        } else {
            origin.to_string()
        }
    }

    /// Headers shared by simple and preflight responses
    fn push_common(&self, headers: &mut HeaderVec) {
        if !self.options.expose_headers.is_empty() {
            push(headers, HEADER_EXPOSE_HEADERS, self.options.expose_headers.join(","));
        }
        if self.options.max_age_secs > 0 {
            push(headers, HEADER_MAX_AGE, self.options.max_age_secs.to_string());
        }
    }

    /// Response headers for a simple (non-preflight) request
    ///
    /// Empty if the origin is not allowed.
    #[must_use]
    pub fn simple_headers(&self, origin: &str) -> HeaderVec {
        let mut headers = HeaderVec::new();
        if !self.is_origin_allowed(origin) {
            if !origin.is_empty() {
                warn!(origin = %origin, "CORS origin not allowed");
            }
            return headers;
        }

        push(&mut headers, HEADER_ALLOW_ORIGIN, self.allow_origin_value(origin));
        push(
            &mut headers,
            HEADER_ALLOW_CREDENTIALS,
            self.options.allow_credentials.to_string(),
        );
        if !self.options.allow_methods.is_empty() {
            push(&mut headers, HEADER_ALLOW_METHODS, self.options.allow_methods.join(","));
        }
        if !self.options.allow_headers.is_empty() {
            push(&mut headers, HEADER_ALLOW_HEADERS, self.options.allow_headers.join(","));
        }
        self.push_common(&mut headers);
        headers
    }

    /// Response headers for a preflight request
    ///
    /// The method list is sent only when `requested_method` is literally one of
    /// the allowed methods. Requested headers are echoed in the caller's
    /// casing when they match an allowed header case-insensitively.
    #[must_use]
    pub fn preflight_headers(
        &self,
        origin: &str,
        requested_method: &str,
        requested_headers: &str,
    ) -> HeaderVec {
        let mut headers = HeaderVec::new();
        if !self.is_origin_allowed(origin) {
            warn!(origin = %origin, "CORS preflight origin not allowed");
            return headers;
        }

        if self.options.allow_methods.iter().any(|m| m == requested_method) {
            push(&mut headers, HEADER_ALLOW_METHODS, self.options.allow_methods.join(","));
        }

        let allowed: Vec<&str> = requested_headers
            .split(',')
            .map(str::trim)
            .filter(|requested| {
                !requested.is_empty()
                    && self
                        .options
                        .allow_headers
                        .iter()
                        .any(|allowed| allowed.eq_ignore_ascii_case(requested))
            })
            .collect();

        push(
            &mut headers,
            HEADER_ALLOW_CREDENTIALS,
            self.options.allow_credentials.to_string(),
        );
        push(&mut headers, HEADER_ALLOW_ORIGIN, self.allow_origin_value(origin));
        if !allowed.is_empty() {
            push(&mut headers, HEADER_ALLOW_HEADERS, allowed.join(","));
        }
        self.push_common(&mut headers);
        headers
    }

    /// An `OPTIONS` request carrying a non-empty request-method or request-headers signal
    #[must_use]
    pub fn is_preflight(req: &HandlerRequest) -> bool {
        req.method == Method::OPTIONS
            && (req
                .get_header(HEADER_REQUEST_METHOD)
                .is_some_and(|v| !v.is_empty())
                || req
                    .get_header(HEADER_REQUEST_HEADERS)
                    .is_some_and(|v| !v.is_empty()))
    }

    /// Run the CORS stage for one request
    ///
    /// Preflights get their headers and a `200` and must not be routed.
    /// Everything else gets the simple headers and continues.
    pub fn apply(&self, req: &HandlerRequest, res: &mut HandlerResponse) -> CorsOutcome {
        let origin = req.get_header(HEADER_ORIGIN).unwrap_or("");

        if Self::is_preflight(req) {
            let headers = self.preflight_headers(
                origin,
                req.get_header(HEADER_REQUEST_METHOD).unwrap_or(""),
                req.get_header(HEADER_REQUEST_HEADERS).unwrap_or(""),
            );
            for (name, value) in headers {
                res.set_header(&name, value);
            }
            res.status = 200;
            debug!(
                request_id = %req.request_id,
                origin = %origin,
                path = %req.path,
                "CORS preflight answered"
            );
            return CorsOutcome::Preflight;
        }

        for (name, value) in self.simple_headers(origin) {
            res.set_header(&name, value);
        }
        CorsOutcome::Continue
    }
}

/// Runs a [`CorsPolicy`] inside a middleware chain
///
/// Useful when only some route groups need CORS: register those groups with
/// a chain containing this middleware instead of enabling CORS service-wide.
/// Note that a preflight only reaches the chain if an `OPTIONS` route exists
/// for the path.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    policy: Arc<CorsPolicy>,
}

impl CorsMiddleware {
    #[must_use]
    pub fn new(policy: CorsPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

struct CorsHandler {
    policy: Arc<CorsPolicy>,
    next: BoxedHandler,
}

impl Handler for CorsHandler {
    fn serve(&self, req: &mut HandlerRequest, res: &mut HandlerResponse) {
        if self.policy.apply(req, res) == CorsOutcome::Continue {
            self.next.serve(req, res);
        }
    }
}

impl Middleware for CorsMiddleware {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(CorsHandler {
            policy: Arc::clone(&self.policy),
            next,
        })
    }
}
