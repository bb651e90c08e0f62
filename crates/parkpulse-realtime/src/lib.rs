//! # parkpulse-realtime
//!
//! Resilient realtime client for the ParkPulse dashboard. Provides:
//!
//! - A long-lived WebSocket connection with an explicit lifecycle state machine
//! - Ping/pong heartbeat liveness detection (catches silently-dead connections)
//! - Automatic reconnection with capped exponential backoff and an attempt limit
//! - Ordered, exactly-once dispatch of server-pushed events to subscribers
//! - A small facade (`RealtimeClient`) for UI code: status, send, reconnect, dispose
//!
//! The transport is abstracted behind the [`transport::Transport`] trait so
//! tests can script connections; production uses `tokio-tungstenite`.

pub mod client;
pub mod connection;
pub mod message;
pub mod subscription;
pub mod transport;

pub use client::{RealtimeClient, Subscription};
pub use connection::state::{ConnectionState, ConnectionStatus};
pub use message::types::{MessageKind, RealtimeMessage};
pub use transport::endpoint::EndpointKind;
