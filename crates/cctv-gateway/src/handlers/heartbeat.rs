//! Heartbeat handler
//!
//! Purely reactive: the server never sends pings of its own.

use super::HandlerResult;
use crate::connection::Connection;
use crate::protocol::ServerMessage;
use std::sync::Arc;
use std::time::Duration;

/// Floor for the watchdog period; `interval` rejects a zero period
const MIN_CHECK_PERIOD: Duration = Duration::from_millis(1);

/// Handles client heartbeats
pub struct HeartbeatHandler;

impl HeartbeatHandler {
    /// Answer a `ping` with a `pong`
    ///
    /// The pong goes through the connection's outbound queue, behind any
    /// event frames already queued.
    pub async fn handle(connection: &Arc<Connection>) -> HandlerResult<()> {
        connection.record_heartbeat();

        tracing::trace!(connection_id = %connection.id(), "Heartbeat received");

        connection.send(ServerMessage::Pong.to_frame()?).await?;
        Ok(())
    }

    /// Resolves when the connection has gone `timeout` without a heartbeat
    ///
    /// Never resolves when `timeout` is `None` or zero.
    pub async fn watch(connection: &Connection, timeout: Option<Duration>) {
        let Some(timeout) = timeout.filter(|t| !t.is_zero()) else {
            return std::future::pending().await;
        };

        let mut check_interval = tokio::time::interval((timeout / 2).max(MIN_CHECK_PERIOD));
        loop {
            check_interval.tick().await;

            let time_since = connection.time_since_heartbeat();
            if time_since > timeout {
                tracing::warn!(
                    connection_id = %connection.id(),
                    time_since_ms = time_since.as_millis(),
                    "Connection timed out (no heartbeat)"
                );
                return;
            }
        }
    }
}
