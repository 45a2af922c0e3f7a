//! Hub counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters updated by the publisher
#[derive(Debug, Default)]
pub(crate) struct HubStats {
    published: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl HubStats {
    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deliveries(&self, delivered: usize, failed: usize) {
        self.delivered.fetch_add(delivered as u64, Ordering::Relaxed);
        self.failed.fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, connections: usize) -> HubStatsSnapshot {
        HubStatsSnapshot {
            connections,
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the hub counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStatsSnapshot {
    /// Currently registered connections
    pub connections: usize,
    /// Events handed to the publisher
    pub published: u64,
    /// Frames queued for a connection
    pub delivered: u64,
    /// Per-connection delivery failures
    pub failed: u64,
}
