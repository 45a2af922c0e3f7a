//! Handler error types

use crate::connection::DeliveryError;
use crate::protocol::CloseCode;
use thiserror::Error;

/// Handler error type
///
/// Every variant is fatal to the connection it occurred on and to nothing else.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Malformed inbound data or a transport-level protocol error
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// A reply could not be queued
    #[error("Failed to queue reply: {0}")]
    SendFailed(#[from] DeliveryError),

    /// Serialization of a reply failed
    #[error("Failed to encode reply: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HandlerError {
    /// Convert to a close code
    pub fn to_close_code(&self) -> CloseCode {
        match self {
            Self::ProtocolViolation(_) => CloseCode::ProtocolError,
            Self::SendFailed(_) => CloseCode::DeliveryFailed,
            Self::Encode(_) => CloseCode::UnknownError,
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
