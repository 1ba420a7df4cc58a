use http::Method;
use restgate::dispatcher::{handler_fn, BoxedHandler, HandlerRequest};
use restgate::middleware::{middleware_fn, wrap, MetricsMiddleware, Middleware, TracingMiddleware};
use restgate::server::{AppService, Configuration};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

mod common;
use common::{counting, named, request, request_with_headers};

use tracing_util::TestTracing;

type Log = Arc<Mutex<Vec<String>>>;

fn recording(name: &'static str, log: &Log) -> Arc<dyn Middleware> {
    let log = Arc::clone(log);
    middleware_fn(move |next: BoxedHandler| {
        let log = Arc::clone(&log);
        handler_fn(move |req, res| {
            log.lock().unwrap().push(format!("{name} in"));
            next.serve(req, res);
            log.lock().unwrap().push(format!("{name} out"));
        })
    })
}

/// Rejects requests without an `Authorization` header
fn require_auth() -> Arc<dyn Middleware> {
    middleware_fn(|next: BoxedHandler| {
        handler_fn(move |req, res| {
            if req.get_header("authorization").is_none() {
                res.write_json(401, serde_json::json!({ "error": "unauthorized" }));
                return;
            }
            next.serve(req, res);
        })
    })
}

#[test]
fn test_chain_order_through_service() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let cfg = Configuration {
        chain: vec![recording("a", &log), recording("b", &log), recording("c", &log)],
        ..Configuration::default()
    };
    let mut service = AppService::new(cfg, Vec::new()).unwrap();
    let handler_log = Arc::clone(&log);
    service
        .get(
            "/",
            handler_fn(move |_req, res| {
                handler_log.lock().unwrap().push("handler".to_string());
                res.write_text(200, "ok");
            }),
        )
        .unwrap();

    let mut req = request(Method::GET, "/");
    let _ = service.serve(&mut req);

    assert_eq!(
        *log.lock().unwrap(),
        vec!["a in", "b in", "c in", "handler", "c out", "b out", "a out"]
    );
}

#[test]
fn test_chain_applies_to_every_registration_path() {
    let hits = Arc::new(AtomicUsize::new(0));
    let cfg = Configuration {
        chain: vec![require_auth()],
        ..Configuration::default()
    };
    let mut service = AppService::new(cfg, Vec::new()).unwrap();
    service.post("/items", counting(&hits)).unwrap();
    service.route(Method::PUT, "/items/:id", counting(&hits)).unwrap();

    for (method, path) in [(Method::POST, "/items"), (Method::PUT, "/items/1")] {
        let mut req = request(method, path);
        let res = service.serve(&mut req);
        assert_eq!(res.status, 401);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    let mut req = request_with_headers(Method::POST, "/items", &[("Authorization", "Bearer t")]);
    assert_eq!(service.serve(&mut req).status, 200);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_middleware_can_modify_request_and_post_process() {
    let stamp = middleware_fn(|next: BoxedHandler| {
        handler_fn(move |req, res| {
            req.headers.push((Arc::from("x-stamped"), "yes".to_string()));
            next.serve(req, res);
            res.set_header("x-served-by", "restgate".to_string());
        })
    });
    let handler = handler_fn(|req: &mut HandlerRequest, res| {
        let stamped = req.get_header("x-stamped").unwrap_or("no").to_string();
        res.write_text(200, &stamped);
    });

    let wrapped = wrap(handler, &[stamp]);
    let mut req = request(Method::GET, "/");
    let mut res = restgate::dispatcher::HandlerResponse::default();
    wrapped.serve(&mut req, &mut res);

    assert_eq!(res.body_text(), "yes");
    assert_eq!(res.get_header("x-served-by"), Some("restgate"));
}

#[test]
fn test_metrics_middleware_counts_requests() {
    let metrics = MetricsMiddleware::new();
    let layer: Arc<dyn Middleware> = Arc::new(metrics.clone());
    let cfg = Configuration {
        chain: vec![layer],
        ..Configuration::default()
    };
    let mut service = AppService::new(cfg, Vec::new()).unwrap();
    service.get("/ok", named("ok")).unwrap();
    service
        .get("/boom", handler_fn(|_req, res| res.write_text(500, "boom")))
        .unwrap();

    for path in ["/ok", "/ok", "/boom"] {
        let mut req = request(Method::GET, path);
        let _ = service.serve(&mut req);
    }
    // Not-found requests never enter the chain
    let mut req = request(Method::GET, "/missing");
    let _ = service.serve(&mut req);

    assert_eq!(metrics.request_count(), 3);
    assert_eq!(metrics.status_class_count(2), 2);
    assert_eq!(metrics.status_class_count(5), 1);
    assert_eq!(metrics.status_class_count(4), 0);
}

#[test]
fn test_tracing_middleware_logs_completion() {
    let tracing = TestTracing::init();
    let layer: Arc<dyn Middleware> = Arc::new(TracingMiddleware);
    let cfg = Configuration {
        chain: vec![layer],
        ..Configuration::default()
    };
    let mut service = AppService::new(cfg, Vec::new()).unwrap();
    service.get("/traced/:id", named("traced")).unwrap();

    let mut req = request(Method::GET, "/traced/5");
    let res = service.serve(&mut req);
    assert_eq!(res.status, 200);

    let logs = tracing.logs.contents();
    assert!(logs.contains("Request complete"));
    assert!(logs.contains(&req.request_id.to_string()));
}
