//! Inbound message handlers
//!
//! The only client message with meaning is the `ping` heartbeat.

mod error;
mod heartbeat;

pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;

use crate::connection::Connection;
use crate::protocol::ClientMessage;
use std::sync::Arc;

/// Dispatch incoming client text frames to appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle an incoming client text frame
    pub async fn dispatch(connection: &Arc<Connection>, text: &str) -> HandlerResult<()> {
        match ClientMessage::parse(text) {
            ClientMessage::Ping => HeartbeatHandler::handle(connection).await,
            ClientMessage::Other(other) => {
                tracing::trace!(
                    connection_id = %connection.id(),
                    len = other.len(),
                    "Ignoring client message"
                );
                Ok(())
            }
        }
    }
}
