//! Session state machine states.
//!
//! ```text
//!            play                 on_started
//!   Idle ─────────────> Starting ────────────> Playing
//!    ^                     │                      │
//!    │      on_stopped     │ stop                 │ stop / focus loss
//!    ├──────────────── Stopping <─────────────────┘
//!    │
//!    └──── Error(reason) <──── on_error (any state)
//! ```
//!
//! `Error` is transient: it is entered while an engine failure is cleaned up
//! and always resolves to `Idle` before the state lock is released.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Starting,
    Playing,
    Stopping,
    Error(String),
}

impl SessionState {
    /// Starting, playing or stopping: holds focus and an engine stream.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Starting | SessionState::Playing | SessionState::Stopping
        )
    }

    /// States `stop` accepts.
    pub fn is_stoppable(&self) -> bool {
        matches!(self, SessionState::Starting | SessionState::Playing)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("Idle"),
            SessionState::Starting => f.write_str("Starting"),
            SessionState::Playing => f.write_str("Playing"),
            SessionState::Stopping => f.write_str("Stopping"),
            SessionState::Error(reason) => write!(f, "Error({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(SessionState::Idle.is_idle());
        assert!(!SessionState::Idle.is_active());
        assert!(SessionState::Starting.is_stoppable());
        assert!(SessionState::Playing.is_stoppable());
        assert!(!SessionState::Stopping.is_stoppable());
        assert!(SessionState::Stopping.is_active());
        assert!(!SessionState::Error("x".into()).is_active());
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::Playing.to_string(), "Playing");
        assert_eq!(
            SessionState::Error("underrun".into()).to_string(),
            "Error(underrun)"
        );
        assert_eq!(SessionState::default(), SessionState::Idle);
    }
}
