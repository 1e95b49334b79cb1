//! Error types for presence operations

use thiserror::Error;

/// Presence error types
#[derive(Debug, Error)]
pub enum PresenceError {
    /// The selected channel rejected startup
    #[error("Initialization failed: {0}")]
    InitializationFailure(String),

    /// A poll or command call rejected or produced nothing
    #[error("State fetch failed: {0}")]
    StateFetchFailure(String),

    /// A raw payload did not match the native schema
    #[error("Normalization failed: {0}")]
    NormalizationFailure(String),

    /// IPC transport error (connect, framing, remote error reply)
    #[error("Channel error: {0}")]
    Channel(String),

    /// The call did not settle in time
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Backend not reachable
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for presence operations
pub type Result<T> = std::result::Result<T, PresenceError>;

impl PresenceError {
    /// Check if retrying the same call later may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Unavailable(_) | Self::Channel(_) | Self::Io(_)
        )
    }

    /// Check if the failure came from a malformed payload
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::NormalizationFailure(_))
    }
}

impl From<serde_json::Error> for PresenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::NormalizationFailure(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(PresenceError::Timeout("persona_get_state".into()).is_recoverable());
        assert!(PresenceError::Unavailable("socket".into()).is_recoverable());
        assert!(!PresenceError::NormalizationFailure("mood".into()).is_recoverable());
        assert!(!PresenceError::InitializationFailure("rejected".into()).is_recoverable());
    }

    #[test]
    fn test_json_errors_are_normalization_failures() {
        let err: PresenceError = serde_json::from_str::<u32>("\"nope\"").unwrap_err().into();
        assert!(err.is_malformed());
    }
}
