//! Connection lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the realtime connection.
///
/// Exactly one state holds at a time. `Closed` is terminal: it is reached
/// only through explicit teardown, a normal-closure close from the server,
/// or reconnect exhaustion, and is never left automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection attempt has started yet.
    Idle,
    /// A connect attempt is in flight.
    Connecting,
    /// The channel is established and frames flow both ways.
    Open,
    /// Waiting out a backoff delay before the next connect attempt.
    ReconnectPending,
    /// An intentional close is in progress.
    Closing,
    /// Permanently idle; only a manual `reconnect()` leaves this state.
    Closed,
}

impl ConnectionState {
    /// Collapse the full state into the simpler view most consumers need.
    pub fn status(self) -> ConnectionStatus {
        match self {
            Self::Open => ConnectionStatus::Connected,
            Self::Connecting => ConnectionStatus::Connecting,
            Self::Idle | Self::ReconnectPending | Self::Closing | Self::Closed => {
                ConnectionStatus::Disconnected
            }
        }
    }

    /// Whether outbound sends are currently permitted.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::ReconnectPending => write!(f, "reconnect_pending"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Collapsed connection status for consumers that do not need the full
/// state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// The channel is open.
    Connected,
    /// A connect attempt is in flight.
    Connecting,
    /// Anything else: idle, waiting on backoff, closing, or closed.
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_open_collapses_to_connected() {
        assert_eq!(ConnectionState::Open.status(), ConnectionStatus::Connected);
        assert_eq!(
            ConnectionState::Connecting.status(),
            ConnectionStatus::Connecting
        );
        for state in [
            ConnectionState::Idle,
            ConnectionState::ReconnectPending,
            ConnectionState::Closing,
            ConnectionState::Closed,
        ] {
            assert_eq!(state.status(), ConnectionStatus::Disconnected);
        }
    }

    #[test]
    fn test_is_open() {
        assert!(ConnectionState::Open.is_open());
        assert!(!ConnectionState::ReconnectPending.is_open());
    }
}
