//! Hub events
//!
//! Defines the domain events producers hand to the publisher.

mod event;
mod event_types;
mod payloads;

pub use event::Event;
pub use event_types::EventType;
pub use payloads::{AlertPayload, CameraStatus, CameraStatusPayload, ProcessStatusPayload, Severity};
