//! Link state machine for transport lifecycle management.
//!
//! Transitions follow the bridge lifecycle:
//! DISCONNECTED → CONNECTING → RUNNING → STOPPED
//!
//! A failed start rolls the link back to DISCONNECTED; a stopped link may
//! reconnect through CONNECTING.

use crate::error::{HandError, HandResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection states of a transport link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkState {
    /// No adapter opened yet.
    #[default]
    Disconnected,
    /// Adapter open and bus handshake in progress.
    Connecting,
    /// Cyclic exchange active; joint control possible.
    Running,
    /// Link torn down after a successful run.
    Stopped,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "DISCONNECTED"),
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Stopped => write!(f, "STOPPED"),
        }
    }
}

impl LinkState {
    /// Check if a transition to `target` is valid from the current state.
    #[must_use]
    pub fn can_transition_to(&self, target: LinkState) -> bool {
        use LinkState::{Connecting, Disconnected, Running, Stopped};

        matches!(
            (self, target),
            // Normal forward progression
            (Disconnected, Connecting)
                | (Connecting, Running)
                // Failed start rolls back
                | (Connecting, Disconnected)
                // Teardown
                | (Running, Stopped)
                // Reconnect after a stop
                | (Stopped, Connecting)
        )
    }

    /// Attempt to transition to `target`, returning an error if invalid.
    pub fn transition_to(&mut self, target: LinkState) -> HandResult<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(HandError::InvalidTransition {
                from: self.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Returns true while the cyclic exchange is (or may be) active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_forward_transitions() {
        let mut state = LinkState::default();
        assert_eq!(state, LinkState::Disconnected);

        assert!(state.transition_to(LinkState::Connecting).is_ok());
        assert!(state.transition_to(LinkState::Running).is_ok());
        assert!(state.is_running());
        assert!(state.transition_to(LinkState::Stopped).is_ok());
    }

    #[test]
    fn test_failed_start_rolls_back() {
        let mut state = LinkState::Connecting;
        assert!(state.transition_to(LinkState::Disconnected).is_ok());
        assert_eq!(state, LinkState::Disconnected);
    }

    #[test]
    fn test_reconnect_after_stop() {
        let mut state = LinkState::Stopped;
        assert!(state.transition_to(LinkState::Connecting).is_ok());
        assert!(state.transition_to(LinkState::Running).is_ok());
    }

    #[test]
    fn test_invalid_transition() {
        let mut state = LinkState::Disconnected;
        let result = state.transition_to(LinkState::Running);
        assert!(result.is_err());
        assert_eq!(state, LinkState::Disconnected);
    }
}
