//! Event envelope

use super::{AlertPayload, CameraStatus, CameraStatusPayload, EventType, ProcessStatusPayload};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// An immutable domain event
///
/// Built by a producer, handed to the publisher, and dropped once every
/// connection in the broadcast snapshot has been tried.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_type: EventType,
    data: Value,
    published_at: DateTime<Utc>,
}

impl Event {
    /// Create an event from a tag and an arbitrary JSON payload
    #[must_use]
    pub fn new(event_type: impl Into<EventType>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            published_at: Utc::now(),
        }
    }

    /// Create an event from any serializable payload
    pub fn from_payload<T: Serialize>(
        event_type: impl Into<EventType>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event_type, serde_json::to_value(payload)?))
    }

    /// `alert.new`
    pub fn alert(alert: &AlertPayload) -> Result<Self, serde_json::Error> {
        Self::from_payload(EventType::AlertNew, alert)
    }

    /// `process.status_changed`
    pub fn process_status(process: &ProcessStatusPayload) -> Result<Self, serde_json::Error> {
        Self::from_payload(EventType::ProcessStatusChanged, process)
    }

    /// `camera.status_changed`
    pub fn camera_status(
        camera_id: i64,
        status: CameraStatus,
        message: Option<String>,
    ) -> Result<Self, serde_json::Error> {
        Self::from_payload(
            EventType::CameraStatusChanged,
            &CameraStatusPayload {
                camera_id,
                status,
                message,
            },
        )
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// When the producer created the event (not sent on the wire)
    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }
}
