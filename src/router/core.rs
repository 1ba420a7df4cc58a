//! Router core module - hot path for request routing.
//!
//! Holds the per-method route table, the parameter container handed to
//! handlers, and the path normalization helpers shared by registration and
//! dispatch.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::Method;
use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::radix::{PathTrie, Route};
use crate::error::RouterError;

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/:id/posts/:post_id).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the route tree built at
/// startup; cloning them per request is an atomic increment. Values are per
/// request and owned.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Path parameters bound by a successful match, in pattern order
///
/// Handlers read these through [`crate::dispatcher::HandlerRequest::params`];
/// the `Params` type is the key under which the service stores them in the
/// request extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(ParamVec);

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a parameter by name
    ///
    /// Linear scan; if a pattern repeats a name the first occurrence wins.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get a parameter and parse it into `T`
    ///
    /// Returns `None` if the parameter is missing or does not parse.
    #[must_use]
    pub fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn push(&mut self, key: impl Into<Arc<str>>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert to a HashMap for compatibility
    /// Note: This allocates - use get() in hot paths
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl From<ParamVec> for Params {
    fn from(params: ParamVec) -> Self {
        Self(params)
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Result of looking up a request path
///
/// `route` is `None` when nothing matched; `tsr` then tells whether the
/// path would have matched with its trailing slash added or removed.
/// Nothing in this crate issues redirects, so callers may ignore it.
#[derive(Debug)]
pub struct RouteMatch<'r, T> {
    /// The matched route
    pub route: Option<&'r Route<T>>,
    /// Bound parameters in pattern order
    pub params: Params,
    /// Trailing slash redirect hint
    pub tsr: bool,
}

impl<'r, T> RouteMatch<'r, T> {
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.route.is_some()
    }

    /// The value attached to the matched route
    #[must_use]
    pub fn value(&self) -> Option<&'r T> {
        self.route.map(|r| &r.value)
    }

    /// The pattern of the matched route
    #[must_use]
    pub fn pattern(&self) -> Option<&'r str> {
        self.route.map(|r| r.pattern.as_str())
    }
}

/// Trim trailing slashes from a request path, never trimming the root.
///
/// Idempotent: `/foo/`, `/foo//` and `/foo` all become `/foo`; `/` stays `/`.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Join a base path and a route path into one clean absolute pattern.
///
/// Empty and `.` segments are dropped, `..` removes the previous segment,
/// and trailing slashes disappear. The result always starts with `/`.
#[must_use]
pub fn join_paths(base: &str, path: &str) -> String {
    let mut segments: SmallVec<[&str; 16]> = SmallVec::new();
    for segment in base.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut joined = String::with_capacity(base.len() + path.len() + 1);
    for segment in segments {
        joined.push('/');
        joined.push_str(segment);
    }
    joined
}

/// Route table with one radix tree per HTTP method
///
/// Methods partition the route space completely: a path registered under
/// GET is invisible to a POST lookup. The table is built during startup and
/// only read afterwards, so it is shared between request threads without
/// locking.
#[derive(Debug)]
pub struct Router<T> {
    tries: HashMap<Method, PathTrie<T>>,
    trim_trailing_slash: bool,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Create an empty router that trims trailing slashes from request paths
    #[must_use]
    pub fn new() -> Self {
        Self {
            tries: HashMap::new(),
            trim_trailing_slash: true,
        }
    }

    /// Enable or disable trailing slash trimming on lookup
    #[must_use]
    pub fn trim_trailing_slash(mut self, trim: bool) -> Self {
        self.trim_trailing_slash = trim;
        self
    }

    /// Register `pattern` for `method`
    ///
    /// The pattern is cleaned with [`join_paths`] before insertion, so
    /// `users/:id/` and `/users/:id` register the same route.
    ///
    /// # Errors
    ///
    /// Returns the [`PathTrie::insert`] errors: malformed patterns and conflicts.
    pub fn insert(&mut self, method: Method, pattern: &str, value: T) -> Result<(), RouterError> {
        let pattern = join_paths("/", pattern);
        let trie = self
            .tries
            .entry(method.clone())
            .or_insert_with(|| PathTrie::new(method.clone()));

        match trie.insert(&pattern, value) {
            Ok(()) => {
                info!(method = %method, pattern = %pattern, "Route registered");
                Ok(())
            }
            Err(e) => {
                warn!(method = %method, pattern = %pattern, error = %e, "Route registration failed");
                Err(e)
            }
        }
    }

    /// Match a request to a route
    ///
    /// Normalizes the path (unless trimming is disabled), then walks the
    /// method's tree. An unknown method is a plain miss.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> RouteMatch<'_, T> {
        let path = if self.trim_trailing_slash {
            normalize_path(path)
        } else {
            path
        };

        debug!(method = %method, path = %path, "Route match attempt");

        let trie = match self.tries.get(method) {
            Some(trie) => trie,
            None => {
                debug!(method = %method, path = %path, "No routes registered for method");
                return RouteMatch {
                    route: None,
                    params: Params::default(),
                    tsr: false,
                };
            }
        };

        let match_start = Instant::now();
        let result = trie.lookup(path);
        let match_duration = match_start.elapsed();

        match result.pattern() {
            Some(pattern) => {
                if match_duration > Duration::from_millis(1) {
                    warn!(
                        method = %method,
                        path = %path,
                        route_pattern = %pattern,
                        duration_us = match_duration.as_micros(),
                        "Slow route matching detected"
                    );
                } else {
                    debug!(
                        method = %method,
                        path = %path,
                        route_pattern = %pattern,
                        path_params = ?result.params,
                        duration_us = match_duration.as_micros(),
                        "Route matched"
                    );
                }
            }
            None => {
                debug!(
                    method = %method,
                    path = %path,
                    tsr = result.tsr,
                    duration_us = match_duration.as_micros(),
                    "No route matched"
                );
            }
        }

        result
    }

    /// Total number of registered routes across all methods
    #[must_use]
    pub fn len(&self) -> usize {
        self.tries.values().map(PathTrie::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every registered (method, pattern) pair, sorted for stable output
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, &str)> {
        let mut routes: Vec<(Method, &str)> = self
            .tries
            .iter()
            .flat_map(|(method, trie)| {
                trie.patterns()
                    .into_iter()
                    .map(move |pattern| (method.clone(), pattern))
            })
            .collect();
        routes.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        routes
    }

    /// Print all registered routes to stdout
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.len());
        for (method, pattern) in self.routes() {
            println!("[route] {method} {pattern}");
        }
    }
}
