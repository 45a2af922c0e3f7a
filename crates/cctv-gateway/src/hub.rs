//! Event hub
//!
//! Owns the connection registry and the publisher. Producers hold an
//! `Arc<EventHub>` and never see individual connections.

use crate::broadcast::{EventPublisher, HubStatsSnapshot, PublishReport};
use crate::connection::ConnectionRegistry;
use crate::events::{AlertPayload, CameraStatus, Event, ProcessStatusPayload};
use crate::protocol::CloseCode;
use cctv_common::HubConfig;
use std::sync::Arc;

/// The real-time broadcast hub
pub struct EventHub {
    registry: Arc<ConnectionRegistry>,
    publisher: EventPublisher,
    config: HubConfig,
}

impl EventHub {
    /// Create a hub with an empty registry
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        let registry = ConnectionRegistry::new_shared(config.max_connections);
        Self {
            publisher: EventPublisher::new(registry.clone()),
            registry,
            config,
        }
    }

    /// Create a new hub wrapped in Arc
    #[must_use]
    pub fn new_shared(config: HubConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Publish an event to every connected client
    pub async fn publish(&self, event: Event) {
        self.publisher.publish(event).await;
    }

    /// Publish an event and return the per-connection outcome
    pub async fn broadcast(&self, event: &Event) -> PublishReport {
        self.publisher.broadcast(event).await
    }

    pub async fn broadcast_alert(&self, alert: &AlertPayload) {
        self.publisher.broadcast_alert(alert).await;
    }

    pub async fn broadcast_process_status(&self, process: &ProcessStatusPayload) {
        self.publisher.broadcast_process_status(process).await;
    }

    pub async fn broadcast_camera_status(
        &self,
        camera_id: i64,
        status: CameraStatus,
        message: Option<String>,
    ) {
        self.publisher
            .broadcast_camera_status(camera_id, status, message)
            .await;
    }

    /// Number of registered connections
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    pub fn stats(&self) -> HubStatsSnapshot {
        self.publisher.stats()
    }

    /// Refuse new connections and ask every live one to close
    ///
    /// Returns the number of connections that were asked to close.
    pub fn shutdown(&self) -> usize {
        let connections = self.registry.close();
        for connection in &connections {
            connection.request_close(CloseCode::GoingAway);
        }

        tracing::info!(closed = connections.len(), "Event hub shut down");
        connections.len()
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
