//! Hub message format
//!
//! Server frames are JSON objects with a `type` field. The client side of the
//! protocol is plain text: the literal `ping` is a heartbeat, anything
//! else is ignored.

use crate::events::{Event, EventType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// A serialized outbound frame
///
/// Serialized once per publish and shared by every connection's queue.
pub type Frame = Arc<str>;

/// Control messages sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Welcome acknowledgment, first frame on every connection
    Connected { message: String },
    /// Heartbeat acknowledgment
    Pong,
}

impl ServerMessage {
    #[must_use]
    pub fn connected(message: impl Into<String>) -> Self {
        Self::Connected {
            message: message.into(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize into a shareable frame
    pub fn to_frame(&self) -> Result<Frame, serde_json::Error> {
        self.to_json().map(Frame::from)
    }
}

/// Event frame: `{"type": <tag>, "data": <payload>}`
#[derive(Debug, Serialize)]
pub struct EventFrame<'a> {
    #[serde(rename = "type")]
    pub event_type: &'a EventType,
    pub data: &'a Value,
}

impl<'a> EventFrame<'a> {
    #[must_use]
    pub fn new(event: &'a Event) -> Self {
        Self {
            event_type: event.event_type(),
            data: event.data(),
        }
    }

    /// Serialize into a shareable frame
    pub fn to_frame(&self) -> Result<Frame, serde_json::Error> {
        serde_json::to_string(self).map(Frame::from)
    }
}

/// Inbound client text frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage<'a> {
    /// Heartbeat ping
    Ping,
    /// Anything else; ignored
    Other(&'a str),
}

impl<'a> ClientMessage<'a> {
    /// Literal text of the heartbeat ping
    pub const PING: &'static str = "ping";

    /// Classify an inbound text frame
    #[must_use]
    pub fn parse(text: &'a str) -> Self {
        if text == Self::PING {
            Self::Ping
        } else {
            Self::Other(text)
        }
    }
}
