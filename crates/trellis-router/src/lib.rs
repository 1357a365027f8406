//! Segment-trie HTTP router.
//!
//! This crate provides the pattern matcher behind the trellis framework:
//! one prefix tree per HTTP method, keyed by `/`-separated path segments.
//!
//! # Pattern grammar
//!
//! - `users`: literal segment, matched by exact text
//! - `:id`: named capture of exactly one segment
//! - `*path`: trailing capture of every remaining segment, joined by `/`
//!
//! # Matching policy
//!
//! Lookup is depth-first with backtracking. At each level, children are
//! tried in insertion order, so when a literal and a capture both accept a
//! segment the one registered first wins. There is no "most specific"
//! ranking beyond that.
//!
//! # Example
//!
//! ```
//! use trellis_router::{Method, RouteRegistry};
//!
//! let mut routes = RouteRegistry::new();
//! routes.add_route(Method::Get, "/hello/:name", "hello").unwrap();
//!
//! let matched = routes.get_route(Method::Get, "/hello/world").unwrap();
//! assert_eq!(matched.pattern(), "/hello/:name");
//! assert_eq!(matched.params.get("name"), Some("world"));
//! ```

#![forbid(unsafe_code)]

mod error;
mod r#match;
mod method;
mod registry;
mod trie;

pub use error::{ParseMethodError, PatternError};
pub use r#match::{Params, RouteMatch};
pub use method::Method;
pub use registry::{PatternPolicy, RouteKey, RouteRegistry, parse_pattern};
pub use trie::Node;
