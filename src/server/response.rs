use http::StatusCode;
use serde_json::json;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Canonical reason phrase for `status`, empty when it has none
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

/// Error handler used when none is configured: `500` with the error text
pub fn default_error_handler(
    res: &mut HandlerResponse,
    _req: &HandlerRequest,
    err: &dyn std::error::Error,
) {
    res.write_json(500, json!({ "error": err.to_string() }));
}

/// Not-found handler used when no error handler is configured
///
/// Writes `404` with `{"error", "method", "path"}`.
pub fn not_found_handler(res: &mut HandlerResponse, req: &HandlerRequest, err: &dyn std::error::Error) {
    res.write_json(
        404,
        json!({
            "error": err.to_string(),
            "method": req.method.as_str(),
            "path": req.path,
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouterError;
    use http::Method;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(418), "I'm a teapot");
        assert_eq!(status_reason(429), "Too Many Requests");
        assert_eq!(status_reason(599), "");
    }

    #[test]
    fn test_not_found_payload() {
        let req = HandlerRequest::new(Method::DELETE, "/gone");
        let err = RouterError::NotFound {
            method: Method::DELETE,
            path: "/gone".to_string(),
        };
        let mut res = HandlerResponse::default();
        not_found_handler(&mut res, &req, &err);
        assert_eq!(res.status, 404);
        assert_eq!(
            res.body,
            json!({
                "error": "no handler found for DELETE /gone",
                "method": "DELETE",
                "path": "/gone",
            })
        );
        assert_eq!(res.get_header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_default_error_handler_is_500() {
        let req = HandlerRequest::new(Method::GET, "/");
        let mut res = HandlerResponse::default();
        default_error_handler(&mut res, &req, &RouterError::ParamsMissing);
        assert_eq!(res.status, 500);
        assert_eq!(
            res.body["error"],
            json!("request carries no route parameters (no route matched)")
        );
    }
}
