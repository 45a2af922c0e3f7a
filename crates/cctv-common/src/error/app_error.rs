//! Application error types
//!
//! Errors that can escape the hub: startup/configuration failures and
//! connection refusal at handshake. Per-connection failures never reach here.

use crate::config::ConfigError;
use serde::Serialize;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Connection admission
    #[error("Connection limit reached ({limit} connections)")]
    CapacityExceeded { limit: usize },

    #[error("Event hub is shutting down")]
    ShuttingDown,

    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    // Server errors
    #[error("Server error: {0}")]
    Server(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            // 503 Service Unavailable
            Self::CapacityExceeded { .. } | Self::ShuttingDown => 503,

            // 500 Internal Server Error
            Self::Config(_) | Self::Server(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Server(_) => "SERVER_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if the client may retry later
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.status_code() == 503
    }

    /// Create a server error
    #[must_use]
    pub fn server(msg: impl fmt::Display) -> Self {
        Self::Server(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Error response structure, shaped like the rest of the backend's API errors
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            code: err.error_code().to_string(),
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
