//! Event payload definitions
//!
//! Typed payloads for the built-in event types. Field names follow the
//! camelCase convention the REST API already uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// === Alerts ===

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// `alert.new` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    pub id: String,
    pub camera_id: i64,
    /// Detection category, e.g. `person_detected`
    #[serde(rename = "type")]
    pub category: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

// === Processes ===

/// `process.status_changed` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStatusPayload {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub cpu_percent: f64,
    #[serde(rename = "memoryMB")]
    pub memory_mb: f64,
}

// === Cameras ===

/// Camera operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraStatus {
    Active,
    Inactive,
    Error,
    Connecting,
}

/// `camera.status_changed` payload
///
/// `message` is always present on the wire, `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraStatusPayload {
    pub camera_id: i64,
    pub status: CameraStatus,
    pub message: Option<String>,
}
