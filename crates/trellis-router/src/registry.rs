//! Route registration and lookup.
//!
//! [`RouteRegistry`] owns one trie per HTTP method plus the handler table.
//! It is populated during a registration phase and only read afterwards.

use std::collections::HashMap;
use std::fmt;

use crate::error::PatternError;
use crate::method::Method;
use crate::r#match::{Params, RouteMatch};
use crate::trie::Node;

/// How to treat patterns that the grammar tolerates but cannot honor fully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatternPolicy {
    /// Drop segments after `*name` and keep going (logged at `warn`).
    #[default]
    Permissive,
    /// Reject such patterns with a [`PatternError`].
    Strict,
}

/// Key of the handler table: method plus the pattern exactly as registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    /// The HTTP method.
    pub method: Method,
    /// The registered pattern.
    pub pattern: String,
}

/// Split a pattern or request path into segments.
///
/// Empty segments are discarded, so leading, trailing and repeated
/// slashes collapse. Collection stops right after the first segment that
/// starts with `*`.
///
/// ```
/// use trellis_router::parse_pattern;
///
/// assert_eq!(parse_pattern("//a///b/"), vec!["a", "b"]);
/// assert_eq!(parse_pattern("/static/*path/ignored"), vec!["static", "*path"]);
/// ```
#[must_use]
pub fn parse_pattern(pattern: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for item in pattern.split('/').filter(|s| !s.is_empty()) {
        parts.push(item);
        if item.starts_with('*') {
            break;
        }
    }
    parts
}

/// Segments that [`parse_pattern`] would drop after a trailing capture.
fn dropped_tail(pattern: &str) -> Option<String> {
    let mut segments = pattern.split('/').filter(|s| !s.is_empty());
    segments.by_ref().find(|s| s.starts_with('*'))?;
    let rest: Vec<&str> = segments.collect();
    (!rest.is_empty()).then(|| rest.join("/"))
}

/// Method-keyed tries and the handlers registered on them.
pub struct RouteRegistry<H> {
    roots: HashMap<Method, Node>,
    handlers: HashMap<RouteKey, H>,
    order: Vec<RouteKey>,
    policy: PatternPolicy,
}

impl<H> RouteRegistry<H> {
    /// Create an empty registry with the permissive pattern policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(PatternPolicy::default())
    }

    /// Create an empty registry with the given pattern policy.
    #[must_use]
    pub fn with_policy(policy: PatternPolicy) -> Self {
        Self {
            roots: HashMap::new(),
            handlers: HashMap::new(),
            order: Vec::new(),
            policy,
        }
    }

    /// The pattern policy in effect.
    #[must_use]
    pub fn policy(&self) -> PatternPolicy {
        self.policy
    }

    /// Register `handler` for `method` and `pattern`.
    ///
    /// The method's trie is created on first use. Registering the same
    /// method and pattern again replaces the handler.
    pub fn add_route(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), PatternError> {
        if let Some(dropped) = dropped_tail(pattern) {
            if self.policy == PatternPolicy::Strict {
                return Err(PatternError::SegmentsAfterWildcard {
                    pattern: pattern.to_owned(),
                    dropped,
                });
            }
            tracing::warn!(
                pattern,
                dropped = %dropped,
                "segments after trailing capture are ignored"
            );
        }

        let parts = parse_pattern(pattern);
        if self.policy == PatternPolicy::Strict && parts.contains(&":") {
            return Err(PatternError::EmptyParamName {
                pattern: pattern.to_owned(),
            });
        }

        self.roots
            .entry(method)
            .or_insert_with(Node::root)
            .insert(pattern, &parts, 0);

        let key = RouteKey {
            method,
            pattern: pattern.to_owned(),
        };
        if self.handlers.insert(key.clone(), handler).is_some() {
            tracing::debug!(%method, pattern, "route handler replaced");
        } else {
            self.order.push(key);
        }
        Ok(())
    }

    /// Find the route matching `method` and `path`.
    ///
    /// On success the matched pattern is walked in lockstep with the
    /// request segments: `:name` binds one segment, `*name` binds the
    /// remaining segments joined by `/` and ends the walk. Captures with
    /// an empty name match but bind nothing.
    #[must_use]
    pub fn get_route(&self, method: Method, path: &str) -> Option<RouteMatch<'_>> {
        let search_parts = parse_pattern(path);
        let root = self.roots.get(&method)?;
        let node = root.search(&search_parts, 0)?;

        let mut params = Params::new();
        for (index, part) in parse_pattern(node.pattern()?).into_iter().enumerate() {
            if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    continue;
                }
                if let Some(value) = search_parts.get(index) {
                    params.insert(name, *value);
                }
            } else if let Some(name) = part.strip_prefix('*') {
                if !name.is_empty() {
                    let rest = search_parts.get(index..).unwrap_or_default();
                    params.insert(name, rest.join("/"));
                }
                break;
            }
        }

        Some(RouteMatch { node, params })
    }

    /// The handler registered under exactly `method` and `pattern`.
    #[must_use]
    pub fn handler(&self, method: Method, pattern: &str) -> Option<&H> {
        self.handlers.get(&RouteKey {
            method,
            pattern: pattern.to_owned(),
        })
    }

    /// The trie root for `method`, if any route was registered for it.
    #[must_use]
    pub fn root(&self, method: Method) -> Option<&Node> {
        self.roots.get(&method)
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteKey> {
        self.order.iter()
    }

    /// Number of distinct method + pattern registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<H> Default for RouteRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for RouteRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("routes", &self.order)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
