//! Transport boundary.
//!
//! The connection driver is written against these traits so the wire can be
//! swapped: production uses `tokio-tungstenite` ([`ws::WsTransport`]), tests
//! script connections with fakes.

pub mod endpoint;
pub mod ws;

use async_trait::async_trait;

use parkpulse_core::AppResult;

/// WebSocket close code for a normal, intentional closure.
pub const NORMAL_CLOSE_CODE: u16 = 1000;

/// An event produced by the receive half of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame arrived.
    Frame(String),
    /// The peer closed the connection.
    Closed {
        /// WebSocket close code (1000 = normal closure).
        code: u16,
        /// Close reason supplied by the peer, possibly empty.
        reason: String,
    },
}

/// Factory for duplex connections.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a connection to `url`, returning its send and receive halves.
    ///
    /// The returned pair is the channel handle: it is owned exclusively by
    /// the connection driver and discarded wholesale on reconnect.
    async fn connect(&self, url: &str) -> AppResult<(Box<dyn FrameSink>, Box<dyn FrameStream>)>;
}

/// Send half of a connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Send one text frame.
    async fn send(&mut self, raw: String) -> AppResult<()>;

    /// Best-effort close with normal-closure semantics. Errors are ignored;
    /// the handle is discarded afterwards either way.
    async fn close(&mut self);
}

/// Receive half of a connection.
#[async_trait]
pub trait FrameStream: Send {
    /// Next event from the peer.
    ///
    /// `None` means the underlying stream ended without a close frame,
    /// which the driver treats as an abnormal disconnect.
    async fn next_event(&mut self) -> Option<AppResult<TransportEvent>>;
}
