// Performance-focused tests for router scalability
//
// These tests validate that lookups stay proportional to the path length
// rather than to the number of registered routes.

use super::Router;
use http::Method;
use std::time::Instant;

fn router(patterns: &[String]) -> Router<usize> {
    let mut router = Router::new();
    for (i, pattern) in patterns.iter().enumerate() {
        router.insert(Method::GET, pattern, i).unwrap();
    }
    router
}

#[test]
fn test_router_performance_with_many_routes() {
    let patterns: Vec<String> = (0..500)
        .map(|i| format!("/api/v1/resource{i}/:id"))
        .collect();
    let router = router(&patterns);

    let start = Instant::now();
    for _ in 0..1000 {
        let result = router.route(&Method::GET, "/api/v1/resource250/123");
        assert_eq!(result.value(), Some(&250));
    }
    let duration = start.elapsed();

    assert!(
        duration.as_millis() < 200,
        "Router performance degraded: {}ms for 1000 lookups with 500 routes",
        duration.as_millis()
    );
}

#[test]
fn test_router_worst_case_performance() {
    let patterns: Vec<String> = ["/a", "/a/b", "/a/b/c", "/a/b/c/d", "/a/b/c/d/e", "/a/b/c/d/e/f"]
        .iter()
        .map(|p| (*p).to_string())
        .collect();
    let router = router(&patterns);

    let start = Instant::now();
    for _ in 0..1000 {
        assert!(router.route(&Method::GET, "/a/b/c/d/e/f").is_match());
    }
    let duration = start.elapsed();

    assert!(
        duration.as_millis() < 100,
        "Deep path matching too slow: {}ms",
        duration.as_millis()
    );
}

#[test]
fn test_router_common_prefix_efficiency() {
    let patterns: Vec<String> = [
        "/api/v1/users",
        "/api/v1/users/:id",
        "/api/v1/users/:id/profile",
        "/api/v1/posts",
        "/api/v1/posts/:id",
        "/api/v2/users",
        "/api/v2/posts",
    ]
    .iter()
    .map(|p| (*p).to_string())
    .collect();
    let router = router(&patterns);

    assert_eq!(router.route(&Method::GET, "/api/v1/users").value(), Some(&0));
    assert_eq!(router.route(&Method::GET, "/api/v1/users/123").value(), Some(&1));
    assert_eq!(
        router.route(&Method::GET, "/api/v1/users/123/profile").value(),
        Some(&2)
    );
    assert_eq!(router.route(&Method::GET, "/api/v1/posts/9").value(), Some(&4));
    assert_eq!(router.route(&Method::GET, "/api/v2/posts").value(), Some(&6));
    assert!(!router.route(&Method::GET, "/api/v3/posts").is_match());
}

#[test]
fn test_router_parameter_extraction_performance() {
    let patterns = vec![
        "/api/:version/users/:user_id/posts/:post_id/comments/:comment_id".to_string(),
    ];
    let router = router(&patterns);

    let start = Instant::now();
    for _ in 0..1000 {
        let result = router.route(&Method::GET, "/api/v1/users/123/posts/456/comments/789");
        assert_eq!(result.params.len(), 4);
        assert_eq!(result.params.get("comment_id"), Some("789"));
    }
    let duration = start.elapsed();

    assert!(
        duration.as_millis() < 200,
        "Parameter extraction too slow: {}ms",
        duration.as_millis()
    );
}
