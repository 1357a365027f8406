//! Router error types.

use thiserror::Error;

/// A route pattern rejected at registration time.
///
/// Only produced under [`PatternPolicy::Strict`](crate::PatternPolicy::Strict);
/// the permissive policy accepts these patterns and logs instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Segments follow a `*name` trailing capture.
    #[error("pattern `{pattern}` has segments after trailing capture: `{dropped}`")]
    SegmentsAfterWildcard {
        /// The pattern as registered.
        pattern: String,
        /// The segments that would have been discarded.
        dropped: String,
    },
    /// A `:` capture segment without a name.
    #[error("pattern `{pattern}` has a capture segment with no name")]
    EmptyParamName {
        /// The pattern as registered.
        pattern: String,
    },
}

/// The method token is not one the router knows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown HTTP method `{0}`")]
pub struct ParseMethodError(pub String);
