//! # Router Module
//!
//! Path matching and route resolution for the service. Every HTTP method gets
//! its own compressed radix tree; a lookup walks only the tree of the request
//! method.
//!
//! ## Pattern Syntax
//!
//! | Segment | Matches | Example |
//! |---------|---------|---------|
//! | `users` | the literal text | `/users` |
//! | `:id` | exactly one non-empty segment | `/users/:id` |
//! | `*path` | the non-empty rest of the path, slashes included | `/files/*path` |
//!
//! A catch-all must be the final segment. Markers are recognised only at the
//! start of a segment.
//!
//! ## Matching
//!
//! Static segments win over parameters and parameters win over catch-alls,
//! with backtracking: `/users/new/posts` still reaches `/users/:id/posts`
//! when a `/users/new` route exists. A miss reports whether toggling the
//! trailing slash would have matched.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use restgate::router::Router;
//!
//! let mut router = Router::new();
//! router.insert(Method::GET, "/users/:id", "get_user").unwrap();
//!
//! let found = router.route(&Method::GET, "/users/42/");
//! assert_eq!(found.value(), Some(&"get_user"));
//! assert_eq!(found.params.get("id"), Some("42"));
//! ```
//!
//! ## Performance
//!
//! - O(k) lookup where k is the path length
//! - Parameters are collected in a `SmallVec` and only allocate past eight values
//! - The tables are immutable after startup and read without locks

mod core;
mod radix;
#[cfg(test)]
mod performance_tests;

pub use core::{
    join_paths, normalize_path, ParamVec, Params, RouteMatch, Router, MAX_INLINE_PARAMS,
};
pub use radix::{PathTrie, Route};
