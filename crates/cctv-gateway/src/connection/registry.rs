//! Connection registry
//!
//! The set of connections currently eligible for broadcasts.
//!
//! All mutations and `snapshot` take the same lock, so a broadcast iterating
//! a snapshot never sees a half-applied registration. Iteration happens on the
//! copy, never while the lock is held.

use super::{Connection, ConnectionId};
use cctv_common::AppError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Proof of registration, used to deregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationHandle {
    id: ConnectionId,
}

impl RegistrationHandle {
    pub(crate) fn new(id: ConnectionId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Registration failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("connection limit of {limit} reached")]
    CapacityExceeded { limit: usize },

    #[error("registry is closed")]
    ShuttingDown,
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::CapacityExceeded { limit } => Self::CapacityExceeded { limit },
            RegistryError::ShuttingDown => Self::ShuttingDown,
        }
    }
}

#[derive(Default)]
struct RegistryInner {
    /// Keyed by ID; IDs are allocated in increasing order, so iteration
    /// follows registration order
    connections: BTreeMap<ConnectionId, Arc<Connection>>,
    closed: bool,
}

/// Tracks all registered connections
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
    next_id: AtomicU64,
    max_connections: Option<usize>,
}

impl ConnectionRegistry {
    /// Create a new registry; `None` means no connection ceiling
    #[must_use]
    pub fn new(max_connections: Option<usize>) -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            next_id: AtomicU64::new(1),
            max_connections,
        }
    }

    /// Create a new registry wrapped in Arc
    #[must_use]
    pub fn new_shared(max_connections: Option<usize>) -> Arc<Self> {
        Arc::new(Self::new(max_connections))
    }

    /// Allocate a fresh connection ID
    ///
    /// IDs are never reused, so a reconnecting client always gets a new one.
    pub fn allocate_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a connection
    ///
    /// # Panics
    /// In debug builds, registering the same ID twice panics. Release builds
    /// log the violation and leave the registry unchanged.
    pub fn register(&self, connection: Arc<Connection>) -> Result<RegistrationHandle, RegistryError> {
        let id = connection.id();
        let mut inner = self.inner.write();

        if inner.closed {
            return Err(RegistryError::ShuttingDown);
        }

        if inner.connections.contains_key(&id) {
            if cfg!(debug_assertions) {
                panic!("connection {id} registered twice");
            }
            tracing::error!(connection_id = %id, "Duplicate registration ignored");
            return Ok(RegistrationHandle::new(id));
        }

        if let Some(limit) = self.max_connections {
            if inner.connections.len() >= limit {
                tracing::warn!(
                    connection_id = %id,
                    limit = limit,
                    "Connection refused, registry at capacity"
                );
                return Err(RegistryError::CapacityExceeded { limit });
            }
        }

        inner.connections.insert(id, connection);
        let total = inner.connections.len();
        drop(inner);

        tracing::debug!(connection_id = %id, total = total, "Connection registered");

        Ok(RegistrationHandle::new(id))
    }

    /// Remove a connection; a no-op if it is already gone
    pub fn deregister(&self, handle: RegistrationHandle) -> Option<Arc<Connection>> {
        let mut inner = self.inner.write();
        let removed = inner.connections.remove(&handle.id);
        let total = inner.connections.len();
        drop(inner);

        if removed.is_some() {
            tracing::debug!(connection_id = %handle.id, total = total, "Connection deregistered");
        }

        removed
    }

    /// Point-in-time copy of all registered connections, in registration order
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.inner.read().connections.values().cloned().collect()
    }

    /// Get a connection by ID
    pub fn get(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.inner.read().connections.get(&id).cloned()
    }

    /// Check if a connection is registered
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.inner.read().connections.contains_key(&id)
    }

    /// Get the number of registered connections
    pub fn len(&self) -> usize {
        self.inner.read().connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a new registration would be refused for capacity
    pub fn is_full(&self) -> bool {
        self.max_connections
            .is_some_and(|limit| self.len() >= limit)
    }

    pub fn max_connections(&self) -> Option<usize> {
        self.max_connections
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.inner.read().closed
    }

    /// Refuse further registrations and remove every connection
    ///
    /// Returns the removed connections so the caller can close them.
    pub fn close(&self) -> Vec<Arc<Connection>> {
        let mut inner = self.inner.write();
        inner.closed = true;
        let drained = std::mem::take(&mut inner.connections);
        drop(inner);

        tracing::info!(count = drained.len(), "Registry closed");

        drained.into_values().collect()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.len())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}
