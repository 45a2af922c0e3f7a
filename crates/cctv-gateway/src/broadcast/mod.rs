//! Event broadcasting
//!
//! Distributes events from in-process producers to WebSocket connections.

mod publisher;
mod stats;

pub use publisher::{DeliveryFailure, EventPublisher, PublishReport};
pub use stats::HubStatsSnapshot;
