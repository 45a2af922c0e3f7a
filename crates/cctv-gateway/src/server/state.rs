//! Gateway state
//!
//! Application state for the gateway server.

use crate::hub::EventHub;
use cctv_common::AppConfig;
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// Broadcast hub shared with event producers
    hub: Arc<EventHub>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(hub: Arc<EventHub>, config: AppConfig) -> Self {
        Self {
            hub,
            config: Arc::new(config),
        }
    }

    /// Get the event hub
    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("hub", &self.hub)
            .field("config", &"AppConfig")
            .finish()
    }
}
