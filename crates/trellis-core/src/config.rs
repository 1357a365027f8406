//! Engine configuration.

use serde::{Deserialize, Serialize};
use trellis_router::PatternPolicy;

use crate::error::ConfigError;

/// Default upper bound on the number of handlers in one request's chain.
pub const DEFAULT_MAX_CHAIN_LEN: usize = 256;

/// Engine-wide settings.
///
/// # Example
///
/// ```
/// use trellis_core::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "strict_patterns": true }"#).unwrap();
/// assert!(config.strict_patterns);
/// assert_eq!(config.max_chain_len, 256);
///
/// let config = EngineConfig::new().max_chain_len(16).log_routes(false);
/// assert_eq!(config.max_chain_len, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Reject patterns with segments after `*name` or unnamed `:` captures
    /// instead of accepting them with a warning.
    pub strict_patterns: bool,
    /// Longest handler chain (middleware plus terminal handler) a request
    /// may assemble. Longer chains get a 500 without running.
    pub max_chain_len: usize,
    /// Log every route registration at `info`.
    pub log_routes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_patterns: false,
            max_chain_len: DEFAULT_MAX_CHAIN_LEN,
            log_routes: true,
        }
    }
}

impl EngineConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings for values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chain_len == 0 {
            return Err(ConfigError::ZeroChainLength);
        }
        Ok(())
    }

    /// Sets strict pattern validation.
    #[must_use]
    pub fn strict_patterns(mut self, strict: bool) -> Self {
        self.strict_patterns = strict;
        self
    }

    /// Sets the maximum chain length.
    #[must_use]
    pub fn max_chain_len(mut self, max: usize) -> Self {
        self.max_chain_len = max;
        self
    }

    /// Sets route registration logging.
    #[must_use]
    pub fn log_routes(mut self, enabled: bool) -> Self {
        self.log_routes = enabled;
        self
    }

    pub(crate) fn pattern_policy(&self) -> PatternPolicy {
        if self.strict_patterns {
            PatternPolicy::Strict
        } else {
            PatternPolicy::Permissive
        }
    }
}
