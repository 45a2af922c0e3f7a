//! Connection management
//!
//! Tracks live WebSocket connections and their lifecycle state.

mod connection;
mod registry;

pub use connection::{Connection, ConnectionId, ConnectionState, DeliveryError};
pub use registry::{ConnectionRegistry, RegistrationHandle, RegistryError};
