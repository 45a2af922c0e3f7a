//! Hub event types
//!
//! Defines the type tags carried in the `type` field of event frames.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Hub event types
///
/// The three built-in tags cover the monitoring producers; any other tag is
/// carried through as `Custom` so new producers do not need a hub release.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A detection produced a new alert
    AlertNew,
    /// A backend process changed status or reported resource usage
    ProcessStatusChanged,
    /// A camera went online, offline, or into an error state
    CameraStatusChanged,
    /// Any other tag
    Custom(String),
}

impl EventType {
    /// Get the wire representation of the event type
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AlertNew => "alert.new",
            Self::ProcessStatusChanged => "process.status_changed",
            Self::CameraStatusChanged => "camera.status_changed",
            Self::Custom(tag) => tag,
        }
    }

    /// Parse a tag, mapping known tags onto their typed variants
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "alert.new" => Self::AlertNew,
            "process.status_changed" => Self::ProcessStatusChanged,
            "camera.status_changed" => Self::CameraStatusChanged,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Check if this is one of the built-in tags
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from(tag))
    }
}
