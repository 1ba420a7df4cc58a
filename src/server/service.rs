use std::fmt;
use std::sync::Arc;

use http::Method;
use tracing::{debug, info, warn};

use super::response::{default_error_handler, not_found_handler};
use crate::dispatcher::{BoxedHandler, ErrorHandler, HandlerRequest, HandlerResponse, HasStatus};
use crate::error::RouterError;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::middleware::{wrap, CorsOutcome, CorsPolicy, Middleware};
use crate::router::{join_paths, normalize_path, RouteMatch, Router};

/// One route to register: method, path below the base URI, and handler
#[derive(Clone)]
pub struct RouteRegistration {
    pub method: Method,
    pub path: String,
    pub handler: BoxedHandler,
}

impl RouteRegistration {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, handler: BoxedHandler) -> Self {
        Self {
            method,
            path: path.into(),
            handler,
        }
    }
}

impl fmt::Debug for RouteRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRegistration")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// A group of routes contributed by one component
///
/// The service registers the routes below the component's base URI and then
/// hands the component its error handler, so the component can report
/// errors the same way the service does.
pub trait HandlerRegistration {
    fn base_uri(&self) -> &str;

    fn handlers_to_register(&self) -> Vec<RouteRegistration>;

    /// Receive the service's error handler
    ///
    /// # Errors
    ///
    /// Any error aborts service construction with [`RouterError::Registration`].
    fn set_error_handler(
        &mut self,
        handler: ErrorHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Settings for building an [`AppService`]
#[derive(Clone)]
pub struct Configuration {
    /// Prefix for every route, e.g. `/v1`
    pub base_uri: String,
    /// Used for not-found and offered to registrations; defaults apply when `None`
    pub error_handler: Option<ErrorHandler>,
    /// Middleware wrapped around every registered handler; `chain[0]` runs first
    pub chain: Vec<Arc<dyn Middleware>>,
    /// Run the CORS stage before routing
    pub cors: bool,
    /// Policy for the CORS stage; allow-all when `cors` is set and this is `None`
    pub cors_policy: Option<CorsPolicy>,
    /// Trim trailing slashes from request paths before routing
    pub trim_trailing_slash: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_uri: String::new(),
            error_handler: None,
            chain: Vec::new(),
            cors: false,
            cors_policy: None,
            trim_trailing_slash: true,
        }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("base_uri", &self.base_uri)
            .field("error_handler", &self.error_handler.is_some())
            .field("chain", &self.chain.len())
            .field("cors", &self.cors)
            .field("cors_policy", &self.cors_policy)
            .field("trim_trailing_slash", &self.trim_trailing_slash)
            .finish()
    }
}

/// The request dispatcher
///
/// Owns the route tables, the middleware chain and the CORS policy. Built
/// once, then shared read-only: [`AppService::serve`] takes `&self`.
pub struct AppService {
    base_uri: String,
    router: Router<BoxedHandler>,
    chain: Vec<Arc<dyn Middleware>>,
    error_handler: ErrorHandler,
    not_found_handler: Option<ErrorHandler>,
    cors: Option<CorsPolicy>,
    trim_trailing_slash: bool,
}

impl fmt::Debug for AppService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppService")
            .field("base_uri", &self.base_uri)
            .field("routes", &self.router.len())
            .field("chain", &self.chain.len())
            .field("cors", &self.cors.is_some())
            .field("trim_trailing_slash", &self.trim_trailing_slash)
            .finish_non_exhaustive()
    }
}

impl AppService {
    /// Build a service and register every collaborator's routes
    ///
    /// With no configured error handler, not-found requests get
    /// [`not_found_handler`] and collaborators get [`default_error_handler`].
    ///
    /// # Errors
    ///
    /// Route pattern errors and conflicts from registration, and
    /// [`RouterError::Registration`] when a collaborator refuses the error handler.
    pub fn new(
        cfg: Configuration,
        registrators: Vec<&mut dyn HandlerRegistration>,
    ) -> Result<Self, RouterError> {
        let (error_handler, not_found): (ErrorHandler, ErrorHandler) = match cfg.error_handler {
            Some(handler) => (Arc::clone(&handler), handler),
            None => {
                let error: ErrorHandler = Arc::new(default_error_handler);
                let not_found: ErrorHandler = Arc::new(not_found_handler);
                (error, not_found)
            }
        };

        let cors = if cfg.cors {
            Some(cfg.cors_policy.unwrap_or_else(CorsPolicy::allow_all))
        } else {
            None
        };

        let mut service = Self {
            base_uri: join_paths("/", &cfg.base_uri),
            router: Router::new().trim_trailing_slash(cfg.trim_trailing_slash),
            chain: cfg.chain,
            error_handler,
            not_found_handler: Some(not_found),
            cors,
            trim_trailing_slash: cfg.trim_trailing_slash,
        };

        for registrator in registrators {
            let base_uri = registrator.base_uri().to_string();
            service.register(registrator.handlers_to_register(), &base_uri)?;
            registrator
                .set_error_handler(Arc::clone(&service.error_handler))
                .map_err(|e| RouterError::Registration {
                    base_uri: base_uri.clone(),
                    reason: e.to_string(),
                })?;
        }

        info!(
            base_uri = %service.base_uri,
            routes = service.router.len(),
            middleware = service.chain.len(),
            cors = service.cors.is_some(),
            "Service ready"
        );

        Ok(service)
    }

    /// Register routes below `base_uri`, each wrapped in the middleware chain
    ///
    /// # Errors
    ///
    /// The first pattern error or conflict; routes before it stay registered.
    pub fn register(
        &mut self,
        routes: Vec<RouteRegistration>,
        base_uri: &str,
    ) -> Result<(), RouterError> {
        let prefix = join_paths(&self.base_uri, base_uri);
        for route in routes {
            let path = join_paths(&prefix, &route.path);
            let handler = wrap(route.handler, &self.chain);
            self.router.insert(route.method, &path, handler)?;
        }
        Ok(())
    }

    /// Register one handler for `method` at `uri` below the service base URI
    ///
    /// # Errors
    ///
    /// Pattern errors and conflicts.
    pub fn route(
        &mut self,
        method: Method,
        uri: &str,
        handler: BoxedHandler,
    ) -> Result<(), RouterError> {
        self.register(vec![RouteRegistration::new(method, uri, handler)], "")
    }

    /// Register a GET handler
    ///
    /// # Errors
    ///
    /// Pattern errors and conflicts.
    pub fn get(&mut self, uri: &str, handler: BoxedHandler) -> Result<(), RouterError> {
        self.route(Method::GET, uri, handler)
    }

    /// Register a POST handler
    ///
    /// # Errors
    ///
    /// Pattern errors and conflicts.
    pub fn post(&mut self, uri: &str, handler: BoxedHandler) -> Result<(), RouterError> {
        self.route(Method::POST, uri, handler)
    }

    /// Register a PUT handler
    ///
    /// # Errors
    ///
    /// Pattern errors and conflicts.
    pub fn put(&mut self, uri: &str, handler: BoxedHandler) -> Result<(), RouterError> {
        self.route(Method::PUT, uri, handler)
    }

    /// Register a DELETE handler
    ///
    /// # Errors
    ///
    /// Pattern errors and conflicts.
    pub fn delete(&mut self, uri: &str, handler: BoxedHandler) -> Result<(), RouterError> {
        self.route(Method::DELETE, uri, handler)
    }

    /// Register a PATCH handler
    ///
    /// # Errors
    ///
    /// Pattern errors and conflicts.
    pub fn patch(&mut self, uri: &str, handler: BoxedHandler) -> Result<(), RouterError> {
        self.route(Method::PATCH, uri, handler)
    }

    /// Register a HEAD handler
    ///
    /// # Errors
    ///
    /// Pattern errors and conflicts.
    pub fn head(&mut self, uri: &str, handler: BoxedHandler) -> Result<(), RouterError> {
        self.route(Method::HEAD, uri, handler)
    }

    /// Register an OPTIONS handler
    ///
    /// With CORS enabled, preflight requests never reach it.
    ///
    /// # Errors
    ///
    /// Pattern errors and conflicts.
    pub fn options(&mut self, uri: &str, handler: BoxedHandler) -> Result<(), RouterError> {
        self.route(Method::OPTIONS, uri, handler)
    }

    /// Replace the not-found handler; `None` writes a bare `404 not found`
    pub fn set_not_found_handler(&mut self, handler: Option<ErrorHandler>) {
        self.not_found_handler = handler;
    }

    /// The error handler handed to registrations
    #[must_use]
    pub fn error_handler(&self) -> ErrorHandler {
        Arc::clone(&self.error_handler)
    }

    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    #[must_use]
    pub fn cors_policy(&self) -> Option<&CorsPolicy> {
        self.cors.as_ref()
    }

    /// Every registered (method, pattern) pair, sorted
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, &str)> {
        self.router.routes()
    }

    /// Dispatch one request
    ///
    /// Normalizes the path, runs the CORS stage (a preflight ends here),
    /// routes, stores the bound [`crate::router::Params`] in the request
    /// extensions and calls the handler. Unmatched requests go to the
    /// not-found handler.
    pub fn serve(&self, req: &mut HandlerRequest) -> HandlerResponse {
        let mut res = HandlerResponse::default();

        req.request_id = RequestId::from_header_or_new(req.get_header(REQUEST_ID_HEADER));
        res.set_header(REQUEST_ID_HEADER, req.request_id.to_string());

        if self.trim_trailing_slash {
            let normalized = normalize_path(&req.path);
            if normalized.len() != req.path.len() {
                req.path = normalized.to_string();
            }
        }

        debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            "Request received"
        );

        if let Some(cors) = &self.cors {
            if cors.apply(req, &mut res) == CorsOutcome::Preflight {
                return res;
            }
        }

        let RouteMatch { route, params, tsr } = self.router.route(&req.method, &req.path);
        match route {
            Some(route) => {
                debug!(
                    request_id = %req.request_id,
                    route_pattern = %route.pattern,
                    "Request dispatched to handler"
                );
                req.extensions.insert(params);
                route.value.serve(req, &mut res);
            }
            None => {
                let err = RouterError::NotFound {
                    method: req.method.clone(),
                    path: req.path.clone(),
                };
                warn!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path,
                    tsr = tsr,
                    "No route matched"
                );
                match &self.not_found_handler {
                    Some(handler) => handler(&mut res, req, &err),
                    None => res.write_text(err.status(), "not found"),
                }
            }
        }

        res
    }
}
