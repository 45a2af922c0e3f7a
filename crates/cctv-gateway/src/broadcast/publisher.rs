//! Event publisher
//!
//! Fans each published event out to every registered connection.
//!
//! The event is serialized once and the resulting frame is pushed onto each
//! connection's outbound queue concurrently. Every enqueue is bounded by the
//! connection's send timeout, so a stalled client costs at most one timeout
//! per publish and is evicted afterwards. A `publish` call returns only after
//! every enqueue has finished, which keeps per-connection order equal to
//! publish order.

use super::stats::{HubStats, HubStatsSnapshot};
use crate::connection::{
    Connection, ConnectionId, ConnectionRegistry, DeliveryError, RegistrationHandle,
};
use crate::events::{AlertPayload, CameraStatus, Event, EventType, ProcessStatusPayload};
use crate::protocol::{CloseCode, EventFrame};
use futures::future::join_all;
use std::sync::Arc;

/// A failed delivery of one event to one connection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("delivery to {connection_id} failed: {error}")]
pub struct DeliveryFailure {
    pub connection_id: ConnectionId,
    pub error: DeliveryError,
}

/// Outcome of a single broadcast, for logging and tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub event_type: EventType,
    /// Connections in the snapshot
    pub attempted: usize,
    /// Connections the frame was queued for
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl PublishReport {
    fn empty(event_type: EventType) -> Self {
        Self {
            event_type,
            attempted: 0,
            delivered: 0,
            failures: Vec::new(),
        }
    }

    /// Check if every connection in the snapshot got the event
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.delivered == self.attempted
    }
}

/// Broadcasts events from producers to all registered connections
pub struct EventPublisher {
    registry: Arc<ConnectionRegistry>,
    stats: HubStats,
}

impl EventPublisher {
    /// Create a new publisher over `registry`
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            stats: HubStats::default(),
        }
    }

    /// Publish an event to every connection
    ///
    /// Fire-and-forget: delivery failures are handled here and never reach
    /// the producer.
    pub async fn publish(&self, event: Event) {
        self.broadcast(&event).await;
    }

    /// Publish an event and return the per-connection outcome
    pub async fn broadcast(&self, event: &Event) -> PublishReport {
        self.stats.record_published();

        let frame = match EventFrame::new(event).to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                // Not a liveness signal: no connection is at fault
                tracing::error!(
                    event_type = %event.event_type(),
                    error = %e,
                    "Failed to serialize event, dropping it"
                );
                return PublishReport::empty(event.event_type().clone());
            }
        };

        let connections = self.registry.snapshot();
        let attempted = connections.len();

        let outcomes = join_all(connections.into_iter().map(|connection| {
            let frame = frame.clone();
            async move {
                let result = connection.send(frame).await;
                (connection, result)
            }
        }))
        .await;

        let mut delivered = 0;
        let mut failures = Vec::new();
        for (connection, result) in outcomes {
            match result {
                Ok(()) => delivered += 1,
                Err(error) => {
                    let failure = DeliveryFailure {
                        connection_id: connection.id(),
                        error,
                    };
                    tracing::warn!(
                        connection_id = %failure.connection_id,
                        event_type = %event.event_type(),
                        error = %failure.error,
                        "Event delivery failed, evicting connection"
                    );
                    self.evict(&connection);
                    failures.push(failure);
                }
            }
        }

        self.stats.record_deliveries(delivered, failures.len());

        tracing::trace!(
            event_type = %event.event_type(),
            attempted = attempted,
            delivered = delivered,
            failed = failures.len(),
            "Event broadcast"
        );

        PublishReport {
            event_type: event.event_type().clone(),
            attempted,
            delivered,
            failures,
        }
    }

    /// Broadcast a new alert
    pub async fn broadcast_alert(&self, alert: &AlertPayload) {
        match Event::alert(alert) {
            Ok(event) => self.publish(event).await,
            Err(e) => tracing::error!(alert_id = %alert.id, error = %e, "Failed to encode alert"),
        }
    }

    /// Broadcast a process status change
    pub async fn broadcast_process_status(&self, process: &ProcessStatusPayload) {
        match Event::process_status(process) {
            Ok(event) => self.publish(event).await,
            Err(e) => {
                tracing::error!(process = %process.name, error = %e, "Failed to encode process status");
            }
        }
    }

    /// Broadcast a camera status change
    pub async fn broadcast_camera_status(
        &self,
        camera_id: i64,
        status: CameraStatus,
        message: Option<String>,
    ) {
        match Event::camera_status(camera_id, status, message) {
            Ok(event) => self.publish(event).await,
            Err(e) => {
                tracing::error!(camera_id = camera_id, error = %e, "Failed to encode camera status");
            }
        }
    }

    /// Current hub counters
    pub fn stats(&self) -> HubStatsSnapshot {
        self.stats.snapshot(self.registry.len())
    }

    /// Deregister a connection that failed delivery and wake its controller
    fn evict(&self, connection: &Connection) {
        self.registry
            .deregister(RegistrationHandle::new(connection.id()));
        connection.request_close(CloseCode::DeliveryFailed);
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("registry", &self.registry)
            .finish()
    }
}
