use std::sync::Arc;

use crate::dispatcher::BoxedHandler;

/// Wraps a handler in cross-cutting behaviour
///
/// A middleware receives the next handler and returns the handler that runs
/// in its place. It may act before calling `next`, after it, or instead of
/// it (short-circuit by writing the response and not calling `next`).
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

struct MiddlewareFn<F>(F);

impl<F> Middleware for MiddlewareFn<F>
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        (self.0)(next)
    }
}

/// Adapt a closure into a [`Middleware`]
pub fn middleware_fn<F>(f: F) -> Arc<dyn Middleware>
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    Arc::new(MiddlewareFn(f))
}

/// Wrap `handler` in `chain`
///
/// Applied in reverse so that `chain[0]` is the outermost layer: its
/// pre-handler logic runs first and its post-handler logic runs last.
#[must_use]
pub fn wrap(handler: BoxedHandler, chain: &[Arc<dyn Middleware>]) -> BoxedHandler {
    chain
        .iter()
        .rev()
        .fold(handler, |next, middleware| middleware.wrap(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{handler_fn, HandlerRequest, HandlerResponse};
    use http::Method;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording(name: &'static str, log: &Log) -> Arc<dyn Middleware> {
        let log = Arc::clone(log);
        middleware_fn(move |next| {
            let log = Arc::clone(&log);
            handler_fn(move |req, res| {
                log.lock().unwrap().push(format!("{name} before"));
                next.serve(req, res);
                log.lock().unwrap().push(format!("{name} after"));
            })
        })
    }

    #[test]
    fn test_chain_zero_is_outermost() {
        let log: Log = Arc::default();
        let inner_log = Arc::clone(&log);
        let handler = handler_fn(move |_req, _res| inner_log.lock().unwrap().push("handler".into()));

        let chain = vec![recording("a", &log), recording("b", &log)];
        let wrapped = wrap(handler, &chain);

        let mut req = HandlerRequest::new(Method::GET, "/");
        let mut res = HandlerResponse::default();
        wrapped.serve(&mut req, &mut res);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a before", "b before", "handler", "b after", "a after"]
        );
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let handler = handler_fn(|_req, res| res.status = 204);
        let wrapped = wrap(Arc::clone(&handler), &[]);
        assert!(Arc::ptr_eq(&handler, &wrapped));
    }

    #[test]
    fn test_middleware_can_short_circuit() {
        let deny = middleware_fn(|next| {
            handler_fn(move |req, res| {
                if req.get_header("authorization").is_none() {
                    res.write_json(401, serde_json::json!({ "error": "Unauthorized" }));
                    return;
                }
                next.serve(req, res);
            })
        });
        let wrapped = wrap(handler_fn(|_req, res| res.write_text(200, "secret")), &[deny]);

        let mut req = HandlerRequest::new(Method::GET, "/");
        let mut res = HandlerResponse::default();
        wrapped.serve(&mut req, &mut res);
        assert_eq!(res.status, 401);

        let mut req = HandlerRequest::new(Method::GET, "/").with_header("Authorization", "token");
        let mut res = HandlerResponse::default();
        wrapped.serve(&mut req, &mut res);
        assert_eq!(res.body_text(), "secret");
    }
}
