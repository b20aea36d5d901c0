/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session states and transition rules.
//!
//! The session moves between five states driven by network events, so the
//! state is a runtime value; [`SessionState::can_transition_to`] encodes
//! the legal moves and the client session asserts them on every change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SessionState {
    /// No negotiation has completed yet.
    #[default]
    NotNegotiated,
    /// Negotiation accepted; establishment pending.
    Negotiated,
    /// Fully established; application flow is open.
    Established,
    /// Finalized; terminal.
    Finalized,
    /// Transport unbound after negotiation or establishment; a reconnect
    /// may restore the established state.
    NotEstablished,
}

impl SessionState {
    /// Returns true if the session can move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotNegotiated, Self::Negotiated)
                | (Self::Negotiated, Self::Established)
                | (Self::Negotiated, Self::NotEstablished)
                | (Self::Established, Self::NotEstablished)
                | (Self::NotEstablished, Self::Established)
                | (Self::NotNegotiated, Self::Finalized)
                | (Self::Negotiated, Self::Finalized)
                | (Self::Established, Self::Finalized)
                | (Self::NotEstablished, Self::Finalized)
        )
    }

    /// Returns true for the terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// Returns the wire-protocol name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotNegotiated => "NOT_NEGOTIATED",
            Self::Negotiated => "NEGOTIATED",
            Self::Established => "ESTABLISHED",
            Self::Finalized => "FINALIZED",
            Self::NotEstablished => "NOT_ESTABLISHED",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SessionState; 5] = [
        SessionState::NotNegotiated,
        SessionState::Negotiated,
        SessionState::Established,
        SessionState::Finalized,
        SessionState::NotEstablished,
    ];

    #[test]
    fn test_happy_path_transitions() {
        assert!(SessionState::NotNegotiated.can_transition_to(SessionState::Negotiated));
        assert!(SessionState::Negotiated.can_transition_to(SessionState::Established));
        assert!(SessionState::Established.can_transition_to(SessionState::Finalized));
    }

    #[test]
    fn test_unbind_and_reconnect() {
        assert!(SessionState::Established.can_transition_to(SessionState::NotEstablished));
        assert!(SessionState::Negotiated.can_transition_to(SessionState::NotEstablished));
        assert!(SessionState::NotEstablished.can_transition_to(SessionState::Established));
        // Unbinding is only reachable after negotiation.
        assert!(!SessionState::NotNegotiated.can_transition_to(SessionState::NotEstablished));
    }

    #[test]
    fn test_finalized_is_terminal() {
        assert!(SessionState::Finalized.is_terminal());
        for state in ALL {
            assert!(!SessionState::Finalized.can_transition_to(state));
        }
    }

    #[test]
    fn test_every_non_terminal_state_can_finalize() {
        for state in ALL {
            if !state.is_terminal() {
                assert!(state.can_transition_to(SessionState::Finalized));
            }
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(SessionState::NotNegotiated.to_string(), "NOT_NEGOTIATED");
        assert_eq!(SessionState::NotEstablished.to_string(), "NOT_ESTABLISHED");
        assert_eq!(SessionState::Established.to_string(), "ESTABLISHED");
    }
}
