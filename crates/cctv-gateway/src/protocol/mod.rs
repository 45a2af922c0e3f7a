//! Hub protocol definitions
//!
//! Defines the WebSocket wire format and close codes.

mod close_codes;
mod messages;

pub use close_codes::CloseCode;
pub use messages::{ClientMessage, EventFrame, Frame, ServerMessage};
