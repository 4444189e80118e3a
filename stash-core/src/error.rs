//! Error types for stash.
//!
//! The cache primitives themselves cannot fail. What remains is misuse caught
//! at construction time (bad keys, bad lifetimes, bad configuration) and the
//! supervision failure of talking to an actor that is no longer running.

use thiserror::Error;

/// Result type alias using `StashError`.
pub type Result<T> = std::result::Result<T, StashError>;

/// Main error type for all stash operations.
#[derive(Debug, Error)]
pub enum StashError {
    // ═══════════════════════════════════════════════════════════════════════════
    // PRECONDITION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Key is empty, too long, or contains whitespace/control characters.
    #[error("Invalid cache key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Lifetime is negative or not a finite number.
    #[error("Invalid lifetime: {0}")]
    InvalidLifetime(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SUPERVISION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The cache actor has stopped and can no longer serve requests.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration value missing or malformed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl StashError {
    /// Returns true if this error is a caller programming error.
    ///
    /// These must never be treated as a cache miss.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            StashError::InvalidKey { .. } | StashError::InvalidLifetime(_)
        )
    }

    /// Returns true if retrying against a restarted cache could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StashError::Unavailable(_))
    }

    pub(crate) fn invalid_key(key: &str, reason: impl Into<String>) -> Self {
        StashError::InvalidKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StashError::invalid_key("bad key", "contains whitespace");
        assert!(err.to_string().contains("bad key"));
        assert!(err.to_string().contains("whitespace"));
    }

    #[test]
    fn test_error_classification() {
        assert!(StashError::invalid_key("", "empty").is_precondition_violation());
        assert!(StashError::InvalidLifetime("-1".into()).is_precondition_violation());
        assert!(!StashError::Unavailable("stopped".into()).is_precondition_violation());

        assert!(StashError::Unavailable("stopped".into()).is_recoverable());
        assert!(!StashError::ConfigError("bad".into()).is_recoverable());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid");
        let stash_result: Result<serde_json::Value> = json_result.map_err(StashError::from);
        assert!(matches!(stash_result, Err(StashError::JsonError(_))));
    }
}
