//! Radix tree implementation for per-method HTTP route matching
//!
//! This module provides a radix tree (also called compact prefix tree) for O(k)
//! route matching where k is the path length, independent of the number of
//! registered routes.
//!
//! ## Key Benefits
//!
//! - **O(k) Lookup**: Route matching time is proportional to path length, not number of routes
//! - **Memory Efficient**: Shared prefixes (e.g., `/api/v1/`) are stored only once
//! - **Lock Free Reads**: The tree is never mutated once registration is over
//!
//! ## Implementation Details
//!
//! A pattern is split into static runs, named parameters and a trailing catch-all:
//!
//! ```text
//! /users/:id/files/*path  =>  "/users/"  :id  "/files/"  *path
//! ```
//!
//! Static runs are stored byte-wise with prefix compression: inserting `/users/new`
//! next to `/users/:id` splits nothing, but inserting `/uploads` next to `/users`
//! turns the `/users` edge into a shared `/u` node with `sers` and `ploads` below it.
//! Each node owns at most one parameter child and at most one catch-all route.
//!
//! Parameter names live on the terminal route rather than on the shared parameter
//! node, so `/users/:user_id/posts` and `/users/:id/comments` coexist and each
//! reports its own names.
//!
//! ## Match Priority
//!
//! At every node the matcher tries the static child first, then the parameter
//! child, then the catch-all. A failing static branch backtracks into the
//! parameter branch and then into the catch-all before the node gives up.

use http::Method;
use smallvec::SmallVec;
use std::sync::Arc;

use super::core::{ParamVec, Params, RouteMatch, MAX_INLINE_PARAMS};
use crate::error::RouterError;

/// Bound values collected while walking the tree, in pattern order
type ValueVec<'p> = SmallVec<[&'p str; MAX_INLINE_PARAMS]>;

/// One piece of a tokenized route pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece<'a> {
    /// Literal bytes, slashes included
    Static(&'a str),
    /// `:name`, binds exactly one segment
    Param(&'a str),
    /// `*name`, binds the rest of the path
    CatchAll(&'a str),
}

/// Split a route pattern into static runs, parameters and a catch-all.
///
/// Markers are only recognised at the start of a segment; a `:` or `*`
/// elsewhere is literal text.
pub(crate) fn tokenize(pattern: &str) -> Result<Vec<Piece<'_>>, RouterError> {
    if !pattern.starts_with('/') {
        return Err(RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "pattern must begin with '/'",
        });
    }

    let mut pieces = Vec::new();
    let mut static_start = 0;
    let mut offset = 0;
    let mut segments = pattern.split('/').peekable();

    while let Some(segment) = segments.next() {
        let seg_start = offset;
        offset += segment.len() + 1;

        let is_catch_all = match segment.as_bytes().first() {
            Some(b':') => false,
            Some(b'*') => true,
            _ => continue,
        };

        let name = &segment[1..];
        if name.is_empty() {
            return Err(RouterError::EmptyParamName {
                pattern: pattern.to_string(),
            });
        }
        if name.contains([':', '*']) {
            return Err(RouterError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "only one parameter marker is allowed per segment",
            });
        }

        if seg_start > static_start {
            pieces.push(Piece::Static(&pattern[static_start..seg_start]));
        }

        if is_catch_all {
            if segments.peek().is_some() {
                return Err(RouterError::CatchAllNotLast {
                    pattern: pattern.to_string(),
                });
            }
            pieces.push(Piece::CatchAll(name));
        } else {
            pieces.push(Piece::Param(name));
        }
        static_start = seg_start + segment.len();
    }

    if static_start < pattern.len() {
        pieces.push(Piece::Static(&pattern[static_start..]));
    }

    Ok(pieces)
}

/// A registered route stored at a terminal node
#[derive(Debug)]
pub struct Route<T> {
    /// The normalized pattern this route was registered with
    pub pattern: String,
    /// Parameter and catch-all names, left to right
    pub param_names: SmallVec<[Arc<str>; MAX_INLINE_PARAMS]>,
    /// The value attached to the route (a handler when used by the service)
    pub value: T,
}

/// Node in the radix tree
///
/// `prefix` holds the bytes consumed when entering this node; parameter
/// nodes have an empty prefix because they consume a whole segment instead.
#[derive(Debug)]
struct RadixNode<T> {
    prefix: Vec<u8>,
    /// First byte of each static child, parallel to `children`
    indices: Vec<u8>,
    children: Vec<RadixNode<T>>,
    param: Option<Box<RadixNode<T>>>,
    catch_all: Option<Route<T>>,
    route: Option<Route<T>>,
}

impl<T> RadixNode<T> {
    fn new(prefix: Vec<u8>) -> Self {
        Self {
            prefix,
            indices: Vec::new(),
            children: Vec::new(),
            param: None,
            catch_all: None,
            route: None,
        }
    }

    /// Walk down `path` through static children, splitting edges and
    /// creating nodes as needed, and return the node where `path` ends.
    fn static_child(&mut self, path: &[u8]) -> &mut RadixNode<T> {
        let first = match path.first() {
            Some(b) => *b,
            None => return self,
        };

        let idx = match self.indices.iter().position(|b| *b == first) {
            Some(idx) => idx,
            None => {
                self.indices.push(first);
                self.children.push(RadixNode::new(path.to_vec()));
                let idx = self.children.len() - 1;
                return &mut self.children[idx];
            }
        };

        let child = &mut self.children[idx];
        let common = common_prefix_len(&child.prefix, path);
        if common < child.prefix.len() {
            child.split(common);
        }
        child.static_child(&path[common..])
    }

    /// Split this node's prefix at `at`, pushing everything it owns into a
    /// new single child that keeps the suffix.
    fn split(&mut self, at: usize) {
        let suffix = self.prefix.split_off(at);
        let lower = RadixNode {
            indices: std::mem::take(&mut self.indices),
            children: std::mem::take(&mut self.children),
            param: self.param.take(),
            catch_all: self.catch_all.take(),
            route: self.route.take(),
            prefix: suffix,
        };
        self.indices = vec![lower.prefix[0]];
        self.children = vec![lower];
    }

    /// Match the remainder of `path` starting at byte `pos`.
    ///
    /// Returns `None` with `values` untouched when nothing below this node matches.
    fn search<'n, 'p>(
        &'n self,
        path: &'p str,
        pos: usize,
        values: &mut ValueVec<'p>,
    ) -> Option<&'n Route<T>> {
        let rest = &path.as_bytes()[pos..];
        let first = match rest.first() {
            Some(b) => *b,
            None => return self.route.as_ref(),
        };

        // Static children first
        if let Some(idx) = self.indices.iter().position(|b| *b == first) {
            let child = &self.children[idx];
            if rest.starts_with(&child.prefix) {
                if let Some(route) = child.search(path, pos + child.prefix.len(), values) {
                    return Some(route);
                }
            }
        }

        // Then the parameter child, consuming one non-empty segment
        if let Some(param) = &self.param {
            let end = rest.iter().position(|b| *b == b'/').unwrap_or(rest.len());
            if end > 0 {
                values.push(&path[pos..pos + end]);
                if let Some(route) = param.search(path, pos + end, values) {
                    return Some(route);
                }
                // Backtrack
                values.pop();
            }
        }

        // Finally the catch-all, which takes whatever is left
        if let Some(route) = &self.catch_all {
            values.push(&path[pos..]);
            return Some(route);
        }

        None
    }

    fn collect_patterns<'n>(&'n self, out: &mut Vec<&'n str>) {
        if let Some(route) = &self.route {
            out.push(route.pattern.as_str());
        }
        for child in &self.children {
            child.collect_patterns(out);
        }
        if let Some(param) = &self.param {
            param.collect_patterns(out);
        }
        if let Some(route) = &self.catch_all {
            out.push(route.pattern.as_str());
        }
    }
}

fn conflict(method: &Method, existing: &str, pattern: &str) -> RouterError {
    RouterError::RouteConflict {
        method: method.clone(),
        existing: existing.to_string(),
        pattern: pattern.to_string(),
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Radix tree holding every route registered for one HTTP method
///
/// # Performance
///
/// - Insertion: O(k) where k is the pattern length
/// - Lookup: O(k) where k is the path length, plus backtracking bounded by path segments
/// - Memory: O(total pattern bytes) with shared prefixes compressed
#[derive(Debug)]
pub struct PathTrie<T> {
    method: Method,
    root: RadixNode<T>,
    len: usize,
}

impl<T> PathTrie<T> {
    /// Create an empty tree for `method`
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            root: RadixNode::new(Vec::new()),
            len: 0,
        }
    }

    /// The method this tree routes
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `pattern` with its attached `value`
    ///
    /// # Errors
    ///
    /// - [`RouterError::InvalidPattern`] / [`RouterError::EmptyParamName`] for malformed patterns
    /// - [`RouterError::CatchAllNotLast`] when a catch-all is followed by more segments
    /// - [`RouterError::RouteConflict`] when a structurally identical pattern already exists
    pub fn insert(&mut self, pattern: &str, value: T) -> Result<(), RouterError> {
        let pieces = tokenize(pattern)?;
        let param_names = pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Param(name) | Piece::CatchAll(name) => Some(Arc::from(*name)),
                Piece::Static(_) => None,
            })
            .collect();
        let route = Route {
            pattern: pattern.to_string(),
            param_names,
            value,
        };

        let mut node = &mut self.root;
        for piece in &pieces {
            match piece {
                Piece::Static(s) => node = node.static_child(s.as_bytes()),
                Piece::Param(_) => {
                    node = &mut **node
                        .param
                        .get_or_insert_with(|| Box::new(RadixNode::new(Vec::new())));
                }
                Piece::CatchAll(_) => {
                    if let Some(existing) = &node.catch_all {
                        return Err(conflict(&self.method, &existing.pattern, pattern));
                    }
                    node.catch_all = Some(route);
                    self.len += 1;
                    return Ok(());
                }
            }
        }

        if let Some(existing) = &node.route {
            return Err(conflict(&self.method, &existing.pattern, pattern));
        }
        node.route = Some(route);
        self.len += 1;
        Ok(())
    }

    /// Match `path` (already normalized) against the tree
    #[must_use]
    pub fn lookup(&self, path: &str) -> RouteMatch<'_, T> {
        let mut values = ValueVec::new();
        if let Some(route) = self.root.search(path, 0, &mut values) {
            let params: ParamVec = route
                .param_names
                .iter()
                .cloned()
                .zip(values.iter().map(|v| (*v).to_string()))
                .collect();
            return RouteMatch {
                route: Some(route),
                params: Params::from(params),
                tsr: false,
            };
        }

        RouteMatch {
            route: None,
            params: Params::default(),
            tsr: self.trailing_slash_matches(path),
        }
    }

    /// Would `path` match with its trailing slash toggled?
    fn trailing_slash_matches(&self, path: &str) -> bool {
        if path.len() > 1 {
            if let Some(trimmed) = path.strip_suffix('/') {
                let mut scratch = ValueVec::new();
                return self.root.search(trimmed, 0, &mut scratch).is_some();
            }
        }
        let mut with_slash = String::with_capacity(path.len() + 1);
        with_slash.push_str(path);
        with_slash.push('/');
        // Declared after `with_slash` so it drops first.
        let mut scratch = ValueVec::new();
        self.root.search(&with_slash, 0, &mut scratch).is_some()
    }

    /// All registered patterns, static branches before parameter branches
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect_patterns(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(patterns: &[&'static str]) -> PathTrie<&'static str> {
        let mut trie = PathTrie::new(Method::GET);
        for p in patterns {
            trie.insert(p, *p).unwrap();
        }
        trie
    }

    fn hit(trie: &PathTrie<&'static str>, path: &str) -> Option<(&'static str, Params)> {
        let m = trie.lookup(path);
        m.route.map(|r| (r.value, m.params))
    }

    #[test]
    fn test_tokenize_pieces() {
        let pieces = tokenize("/users/:id/files/*path").unwrap();
        assert_eq!(
            pieces,
            vec![
                Piece::Static("/users/"),
                Piece::Param("id"),
                Piece::Static("/files/"),
                Piece::CatchAll("path"),
            ]
        );
        assert_eq!(tokenize("/").unwrap(), vec![Piece::Static("/")]);
        assert_eq!(
            tokenize("/a:b/c").unwrap(),
            vec![Piece::Static("/a:b/c")],
            "markers inside a segment are literal"
        );
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(matches!(
            tokenize("/files/*rest/more"),
            Err(RouterError::CatchAllNotLast { .. })
        ));
        assert!(matches!(
            tokenize("/users/:"),
            Err(RouterError::EmptyParamName { .. })
        ));
        assert!(matches!(
            tokenize("users"),
            Err(RouterError::InvalidPattern { .. })
        ));
        assert!(matches!(
            tokenize("/:a:b"),
            Err(RouterError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_radix_router_simple_route() {
        let trie = trie(&["/health"]);
        let (value, params) = hit(&trie, "/health").unwrap();
        assert_eq!(value, "/health");
        assert!(params.is_empty());
        assert!(hit(&trie, "/healthz").is_none());
        assert!(hit(&trie, "/heal").is_none());
    }

    #[test]
    fn test_radix_router_with_parameter() {
        let trie = trie(&["/users/:id"]);
        let (value, params) = hit(&trie, "/users/123").unwrap();
        assert_eq!(value, "/users/:id");
        assert_eq!(params.get("id"), Some("123"));
        assert!(hit(&trie, "/users/123/extra").is_none());
    }

    #[test]
    fn test_radix_router_multiple_parameters_in_order() {
        let trie = trie(&["/users/:user_id/posts/:post_id"]);
        let (_, params) = hit(&trie, "/users/123/posts/456").unwrap();
        let pairs: Vec<(&str, &str)> = params.iter().collect();
        assert_eq!(pairs, vec![("user_id", "123"), ("post_id", "456")]);
    }

    #[test]
    fn test_prefix_split_keeps_both_routes() {
        let trie = trie(&["/users", "/uploads", "/up", "/u"]);
        assert_eq!(hit(&trie, "/users").unwrap().0, "/users");
        assert_eq!(hit(&trie, "/uploads").unwrap().0, "/uploads");
        assert_eq!(hit(&trie, "/up").unwrap().0, "/up");
        assert_eq!(hit(&trie, "/u").unwrap().0, "/u");
        assert!(hit(&trie, "/upl").is_none());
        assert!(hit(&trie, "/").is_none());
    }

    #[test]
    fn test_prefix_split_below_parameter() {
        let trie = trie(&["/api/:v/users", "/api/:v/uploads", "/api/:v"]);
        assert_eq!(hit(&trie, "/api/1/users").unwrap().0, "/api/:v/users");
        assert_eq!(hit(&trie, "/api/1/uploads").unwrap().0, "/api/:v/uploads");
        assert_eq!(hit(&trie, "/api/1").unwrap().0, "/api/:v");
    }

    #[test]
    fn test_static_beats_parameter() {
        let trie = trie(&["/users/:id", "/users/new"]);
        assert_eq!(hit(&trie, "/users/new").unwrap().0, "/users/new");
        let (value, params) = hit(&trie, "/users/newer").unwrap();
        assert_eq!(value, "/users/:id");
        assert_eq!(params.get("id"), Some("newer"));
    }

    #[test]
    fn test_backtracks_from_static_into_parameter() {
        let trie = trie(&["/users/new", "/users/:id/posts"]);
        let (value, params) = hit(&trie, "/users/new/posts").unwrap();
        assert_eq!(value, "/users/:id/posts");
        assert_eq!(params.get("id"), Some("new"));
    }

    #[test]
    fn test_backtracks_into_catch_all() {
        let trie = trie(&["/files/:name/meta", "/files/*rest"]);
        let (value, params) = hit(&trie, "/files/a/meta").unwrap();
        assert_eq!(value, "/files/:name/meta");
        assert_eq!(params.get("name"), Some("a"));

        let (value, params) = hit(&trie, "/files/a/b/c").unwrap();
        assert_eq!(value, "/files/*rest");
        assert_eq!(params.len(), 1, "failed parameter branch must not leak values");
        assert_eq!(params.get("rest"), Some("a/b/c"));
    }

    #[test]
    fn test_catch_all_binds_remainder() {
        let trie = trie(&["/files/*rest"]);
        let (_, params) = hit(&trie, "/files/a/b/c").unwrap();
        assert_eq!(params.get("rest"), Some("a/b/c"));
        let (_, params) = hit(&trie, "/files/readme.md").unwrap();
        assert_eq!(params.get("rest"), Some("readme.md"));
    }

    #[test]
    fn test_catch_all_needs_at_least_one_byte() {
        let trie = trie(&["/files/*rest"]);
        assert!(hit(&trie, "/files").is_none());
        assert!(hit(&trie, "/files/").is_none());
    }

    #[test]
    fn test_root_catch_all() {
        let trie = trie(&["/", "/*path"]);
        assert_eq!(hit(&trie, "/").unwrap().0, "/");
        let (value, params) = hit(&trie, "/a/b").unwrap();
        assert_eq!(value, "/*path");
        assert_eq!(params.get("path"), Some("a/b"));
    }

    #[test]
    fn test_radix_router_different_param_names_same_position() {
        let trie = trie(&["/users/:user_id/posts", "/users/:id/comments"]);

        let (value, params) = hit(&trie, "/users/123/posts").unwrap();
        assert_eq!(value, "/users/:user_id/posts");
        assert_eq!(params.get("user_id"), Some("123"));
        assert_eq!(params.get("id"), None);

        let (value, params) = hit(&trie, "/users/456/comments").unwrap();
        assert_eq!(value, "/users/:id/comments");
        assert_eq!(params.get("id"), Some("456"));
        assert_eq!(params.get("user_id"), None);
    }

    #[test]
    fn test_conflicting_parameter_names() {
        let mut trie = PathTrie::new(Method::GET);
        trie.insert("/users/:id", 1).unwrap();
        let err = trie.insert("/users/:name", 2).unwrap_err();
        assert_eq!(
            err,
            RouterError::RouteConflict {
                method: Method::GET,
                existing: "/users/:id".to_string(),
                pattern: "/users/:name".to_string(),
            }
        );
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_conflicting_catch_all() {
        let mut trie = PathTrie::new(Method::PUT);
        trie.insert("/files/*a", 1).unwrap();
        assert!(matches!(
            trie.insert("/files/*b", 2),
            Err(RouterError::RouteConflict { .. })
        ));
    }

    #[test]
    fn test_parameter_and_catch_all_coexist() {
        let trie = trie(&["/files/:name", "/files/*rest"]);
        assert_eq!(hit(&trie, "/files/a").unwrap().0, "/files/:name");
        assert_eq!(hit(&trie, "/files/a/b").unwrap().0, "/files/*rest");
    }

    #[test]
    fn test_trailing_slash_signal() {
        let trie = trie(&["/foo", "/bar/"]);
        let m = trie.lookup("/foo/");
        assert!(m.route.is_none());
        assert!(m.tsr);

        let m = trie.lookup("/bar");
        assert!(m.route.is_none());
        assert!(m.tsr);

        let m = trie.lookup("/baz");
        assert!(!m.tsr);
    }

    #[test]
    fn test_non_ascii_prefixes() {
        let trie = trie(&["/café", "/cafè", "/caf/:x"]);
        assert_eq!(hit(&trie, "/café").unwrap().0, "/café");
        assert_eq!(hit(&trie, "/cafè").unwrap().0, "/cafè");
        assert_eq!(hit(&trie, "/caf/é").unwrap().1.get("x"), Some("é"));
    }

    #[test]
    fn test_patterns_lists_every_route() {
        let trie = trie(&["/a", "/a/:b", "/a/*c", "/b"]);
        let mut patterns = trie.patterns();
        patterns.sort_unstable();
        assert_eq!(patterns, vec!["/a", "/a/*c", "/a/:b", "/b"]);
        assert_eq!(trie.len(), 4);
    }
}
