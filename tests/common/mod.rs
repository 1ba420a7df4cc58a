#![allow(dead_code)]

use http::Method;
use restgate::dispatcher::{handler_fn, BoxedHandler, HandlerRequest};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Handler that answers `200` with its own name as the body
pub fn named(name: &'static str) -> BoxedHandler {
    handler_fn(move |_req, res| res.write_text(200, name))
}

/// Handler that counts its invocations
pub fn counting(hits: &Arc<AtomicUsize>) -> BoxedHandler {
    let hits = Arc::clone(hits);
    handler_fn(move |_req, res| {
        hits.fetch_add(1, Ordering::SeqCst);
        res.write_text(200, "handled");
    })
}

pub fn request(method: Method, target: &str) -> HandlerRequest {
    HandlerRequest::new(method, target)
}

pub fn request_with_headers(method: Method, target: &str, headers: &[(&str, &str)]) -> HandlerRequest {
    headers
        .iter()
        .fold(HandlerRequest::new(method, target), |req, (name, value)| {
            req.with_header(name, *value)
        })
}

pub mod temp_files {
    use std::io::Write;

    /// Write `content` to a temp file with the given extension
    pub fn create_temp_config(content: &str, ext: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("restgate_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> tempfile::NamedTempFile {
        create_temp_config(content, "yaml")
    }

    pub fn create_temp_toml(content: &str) -> tempfile::NamedTempFile {
        create_temp_config(content, "toml")
    }
}
