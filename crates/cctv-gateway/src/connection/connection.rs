//! Individual WebSocket connection
//!
//! Represents a single client connection, its lifecycle state, and the
//! ordered outbound queue feeding its socket writer.

use crate::protocol::{CloseCode, Frame};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tokio::sync::Notify;
use tokio::time::Instant;

/// Unique connection identifier, assigned by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Connection state
///
/// States only move forward: `Connecting → Active → Closing → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Handshake accepted, not yet registered
    Connecting,
    /// Registered and eligible for broadcasts
    Active,
    /// Being torn down
    Closing,
    /// Deregistered, socket released
    Closed,
}

/// Why a frame could not be queued for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The connection's writer is gone or the connection is closing
    #[error("connection closed")]
    Closed,
    /// The outbound queue stayed full for the whole send timeout
    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

/// A single WebSocket connection
pub struct Connection {
    /// Unique connection ID
    id: ConnectionId,

    /// Current lifecycle state
    state: RwLock<ConnectionState>,

    /// Ordered outbound queue; drained by exactly one socket writer
    sender: mpsc::Sender<Frame>,

    /// Upper bound for a single enqueue
    send_timeout: Duration,

    /// Last heartbeat received
    last_heartbeat: RwLock<Instant>,

    /// Close code requested by someone other than the controller
    close_code: Mutex<Option<CloseCode>>,

    /// Wakes the lifecycle controller when a close is requested
    close_signal: Notify,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new connection in the `Connecting` state
    pub fn new(id: ConnectionId, sender: mpsc::Sender<Frame>, send_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            id,
            state: RwLock::new(ConnectionState::Connecting),
            sender,
            send_timeout,
            last_heartbeat: RwLock::new(Instant::now()),
            close_code: Mutex::new(None),
            close_signal: Notify::new(),
            created_at: Instant::now(),
        })
    }

    /// Get the connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Whether the connection is eligible for broadcasts
    pub fn is_alive(&self) -> bool {
        self.state() == ConnectionState::Active
    }

    /// Move the connection forward to `next`
    ///
    /// Returns `false` (and leaves the state untouched) when `next` is not
    /// strictly after the current state.
    pub fn advance(&self, next: ConnectionState) -> bool {
        let mut state = self.state.write();
        if next <= *state {
            return false;
        }

        tracing::trace!(
            connection_id = %self.id,
            from = ?*state,
            to = ?next,
            "Connection state changed"
        );
        *state = next;
        true
    }

    /// Ask the lifecycle controller to close this connection
    ///
    /// The first requested code wins. Returns `false` if the connection was
    /// already closing.
    pub fn request_close(&self, code: CloseCode) -> bool {
        {
            let mut close_code = self.close_code.lock();
            if close_code.is_none() {
                *close_code = Some(code);
            }
        }

        let moved = self.advance(ConnectionState::Closing);
        // notify_one stores a permit, so a controller that is not polling yet still wakes
        self.close_signal.notify_one();
        moved
    }

    /// Close code requested through `request_close`, if any
    pub fn requested_close_code(&self) -> Option<CloseCode> {
        *self.close_code.lock()
    }

    /// Resolves once `request_close` has been called
    pub async fn close_requested(&self) {
        self.close_signal.notified().await;
    }

    /// Record a heartbeat received
    pub fn record_heartbeat(&self) {
        *self.last_heartbeat.write() = Instant::now();
    }

    /// Get time since last heartbeat
    pub fn time_since_heartbeat(&self) -> Duration {
        self.last_heartbeat.read().elapsed()
    }

    /// Get connection age
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Queue a frame for this connection
    ///
    /// Waits at most `send_timeout` for room in the outbound queue.
    pub async fn send(&self, frame: Frame) -> Result<(), DeliveryError> {
        if self.state() >= ConnectionState::Closing {
            return Err(DeliveryError::Closed);
        }

        self.sender
            .send_timeout(frame, self.send_timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => DeliveryError::Timeout(self.send_timeout),
                SendTimeoutError::Closed(_) => DeliveryError::Closed,
            })
    }

    /// Check if the outbound queue has been closed by its writer
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("created_at", &self.created_at)
            .finish()
    }
}
