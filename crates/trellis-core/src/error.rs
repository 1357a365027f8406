//! Error types.

use thiserror::Error;

/// A route pattern rejected at registration.
pub use trellis_router::PatternError as RouteError;

/// An [`EngineConfig`](crate::EngineConfig) that cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document did not describe a configuration.
    #[error("invalid engine configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// `max_chain_len` was zero, which would refuse every request.
    #[error("max_chain_len must be at least 1")]
    ZeroChainLength,
}
