//! # cctv-gateway
//!
//! Real-time event hub for the CCTV monitoring backend.
//!
//! Dashboard clients connect over WebSocket at `/ws/events`; backend
//! producers publish alerts, process status and camera status changes through
//! [`EventHub`], and every connected client receives each event in publish
//! order.

pub mod broadcast;
pub mod connection;
pub mod events;
pub mod handlers;
pub mod hub;
pub mod protocol;
pub mod server;

pub use hub::EventHub;
pub use server::{create_app, create_gateway_state, run, run_server, GatewayState};
