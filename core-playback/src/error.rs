//! # Session Error Types
//!
//! Every rejection a playback session can report, grouped by how the caller
//! should react to it.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors returned by [`PlaybackSession`](crate::PlaybackSession) operations
/// and by the configuration catalog.
#[derive(Error, Debug)]
pub enum SessionError {
    // ========================================================================
    // Caller Misuse
    // ========================================================================
    /// `play` was called while a session is starting, playing or stopping.
    #[error("Playback session already active")]
    AlreadyActive,

    /// `stop` was called with nothing starting or playing.
    #[error("Playback session is not playing")]
    NotPlaying,

    /// `configure` was called outside the idle state.
    #[error("Cannot change configuration while a session is active")]
    ConfigurationWhilePlaying,

    /// The session was released and cannot be used again.
    #[error("Playback session has been released")]
    Released,

    // ========================================================================
    // Validation
    // ========================================================================
    /// The configuration is malformed.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // ========================================================================
    // Resource Contention
    // ========================================================================
    /// The focus arbiter refused the request.
    #[error("Audio focus request denied")]
    FocusDenied,

    // ========================================================================
    // Engine Failures
    // ========================================================================
    /// The engine refused the stream parameters.
    #[error("Engine rejected configuration: {0}")]
    EngineConfigurationRejected(String),

    /// The engine refused the start request synchronously.
    #[error("Engine failed to start: {0}")]
    EngineStartFailed(String),

    /// Any other engine failure.
    #[error("Engine error: {0}")]
    Engine(String),

    // ========================================================================
    // Infrastructure
    // ========================================================================
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    /// The configuration source could not produce a list.
    #[error("Configuration catalog error: {0}")]
    Catalog(String),
}

impl SessionError {
    /// Operation invoked in a state that does not allow it. No state changed.
    pub fn is_caller_misuse(&self) -> bool {
        matches!(
            self,
            SessionError::AlreadyActive
                | SessionError::NotPlaying
                | SessionError::ConfigurationWhilePlaying
                | SessionError::Released
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::InvalidConfiguration(_))
    }

    /// Another owner holds the output; retrying later may succeed.
    pub fn is_contention(&self) -> bool {
        matches!(self, SessionError::FocusDenied)
    }

    pub fn is_engine_failure(&self) -> bool {
        matches!(
            self,
            SessionError::EngineConfigurationRejected(_)
                | SessionError::EngineStartFailed(_)
                | SessionError::Engine(_)
                | SessionError::Bridge(_)
        )
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_disjoint() {
        let errors = [
            SessionError::AlreadyActive,
            SessionError::NotPlaying,
            SessionError::ConfigurationWhilePlaying,
            SessionError::Released,
            SessionError::InvalidConfiguration("blank".into()),
            SessionError::FocusDenied,
            SessionError::EngineConfigurationRejected("rate".into()),
            SessionError::EngineStartFailed("device".into()),
            SessionError::Engine("disconnected".into()),
            SessionError::Bridge(BridgeError::OperationFailed("x".into())),
        ];

        for error in &errors {
            let hits = [
                error.is_caller_misuse(),
                error.is_validation(),
                error.is_contention(),
                error.is_engine_failure(),
            ]
            .iter()
            .filter(|hit| **hit)
            .count();
            assert_eq!(hits, 1, "{error:?} should belong to exactly one category");
        }
    }

    #[test]
    fn test_messages_carry_reason() {
        let error = SessionError::InvalidConfiguration("source path is blank".into());
        assert_eq!(
            error.to_string(),
            "Invalid configuration: source path is blank"
        );
    }

    #[test]
    fn test_bridge_errors_convert() {
        let error: SessionError = BridgeError::InvalidState("released".into()).into();
        assert!(matches!(error, SessionError::Bridge(_)));
    }
}
