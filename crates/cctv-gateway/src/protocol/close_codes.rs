//! WebSocket close codes
//!
//! Standard codes for ordinary closes plus hub-specific codes in the 4000 range.

use serde::{Deserialize, Serialize};

/// Hub WebSocket close codes
///
/// Sent in the close frame when the server ends a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    /// Normal closure
    Normal = 1000,
    /// Server is shutting down
    GoingAway = 1001,
    /// Malformed frames or transport-level protocol error
    ProtocolError = 1002,
    /// Unknown error occurred
    UnknownError = 4000,
    /// An event could not be delivered within the send timeout
    DeliveryFailed = 4001,
    /// No ping received within the heartbeat window
    HeartbeatTimeout = 4002,
    /// Connection limit reached
    CapacityExceeded = 4003,
}

impl CloseCode {
    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the description for this close code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Normal => "Connection closed",
            Self::GoingAway => "Server shutting down",
            Self::ProtocolError => "Protocol error",
            Self::UnknownError => "Unknown error occurred",
            Self::DeliveryFailed => "Event delivery failed",
            Self::HeartbeatTimeout => "Heartbeat timeout",
            Self::CapacityExceeded => "Connection limit reached",
        }
    }

    /// Get the name of this close code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::GoingAway => "GoingAway",
            Self::ProtocolError => "ProtocolError",
            Self::UnknownError => "UnknownError",
            Self::DeliveryFailed => "DeliveryFailed",
            Self::HeartbeatTimeout => "HeartbeatTimeout",
            Self::CapacityExceeded => "CapacityExceeded",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.as_u16(), self.description())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}
