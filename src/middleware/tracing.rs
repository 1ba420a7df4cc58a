use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span};

use super::Middleware;
use crate::dispatcher::{BoxedHandler, Handler, HandlerRequest, HandlerResponse};

/// Opens a `request` span around the handler and logs status and latency
///
/// Handlers and inner middleware log inside the span, so their events carry
/// the request id, method and path.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

struct TracedHandler {
    next: BoxedHandler,
}

impl Handler for TracedHandler {
    fn serve(&self, req: &mut HandlerRequest, res: &mut HandlerResponse) {
        let span = info_span!(
            "request",
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
        );
        let _guard = span.enter();

        let start = Instant::now();
        self.next.serve(req, res);
        let latency = start.elapsed();

        info!(
            status = res.status,
            latency_us = latency.as_micros() as u64,
            "Request complete"
        );
    }
}

impl Middleware for TracingMiddleware {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(TracedHandler { next })
    }
}
