use crate::dispatcher::{params_fn, BoxedHandler};
use serde_json::json;

/// Handler that echoes the request back as JSON
///
/// Used by the CLI to stand in for real handlers when a service is built
/// from a route manifest. `name` identifies the route in the output.
pub fn echo_handler(name: impl Into<String>) -> BoxedHandler {
    let name = name.into();
    params_fn(move |params, req, res| {
        res.write_json(
            200,
            json!({
                "route": name,
                "method": req.method.as_str(),
                "path": req.path,
                "params": params,
                "query": req.query_params_map(),
                "body": req.body,
            }),
        );
    })
}
