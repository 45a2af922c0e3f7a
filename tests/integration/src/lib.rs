//! Integration test utilities for the CCTV event gateway
//!
//! This crate provides helpers for running end-to-end tests against a real
//! gateway bound to an ephemeral port, with real WebSocket clients.

pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
