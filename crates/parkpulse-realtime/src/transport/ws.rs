//! WebSocket transport over `tokio-tungstenite`.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use parkpulse_core::error::ErrorKind;
use parkpulse_core::{AppError, AppResult};

use super::{FrameSink, FrameStream, Transport, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Close code reported when the peer sent no close frame at all.
const NO_STATUS_CODE: u16 = 1005;

/// Production transport: opens WebSocket connections with
/// `tokio_tungstenite::connect_async`.
#[derive(Debug, Default, Clone)]
pub struct WsTransport;

impl WsTransport {
    /// Creates the transport.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, url: &str) -> AppResult<(Box<dyn FrameSink>, Box<dyn FrameStream>)> {
        debug!(url = %url, "Opening WebSocket connection");

        let (ws, _response) = connect_async(url)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Transport, "WebSocket connect failed", e))?;

        let (sink, stream) = ws.split();
        Ok((
            Box::new(WsFrameSink { sink }),
            Box::new(WsFrameStream { stream }),
        ))
    }
}

struct WsFrameSink {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for WsFrameSink {
    async fn send(&mut self, raw: String) -> AppResult<()> {
        self.sink
            .send(Message::Text(raw.into()))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Transport, "WebSocket send failed", e))
    }

    async fn close(&mut self) {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        let _ = self.sink.send(Message::Close(Some(frame))).await;
        let _ = self.sink.close().await;
    }
}

struct WsFrameStream {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl FrameStream for WsFrameStream {
    async fn next_event(&mut self) -> Option<AppResult<TransportEvent>> {
        loop {
            return match self.stream.next().await? {
                Ok(Message::Text(text)) => {
                    Some(Ok(TransportEvent::Frame(text.as_str().to_owned())))
                }
                Ok(Message::Close(frame)) => {
                    let (code, reason) = match frame {
                        Some(f) => (u16::from(f.code), f.reason.as_str().to_owned()),
                        None => (NO_STATUS_CODE, String::new()),
                    };
                    Some(Ok(TransportEvent::Closed { code, reason }))
                }
                // Protocol-level ping/pong is answered by tungstenite itself;
                // binary frames are not part of the dashboard protocol.
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
                Ok(other) => {
                    debug!(kind = ?other, "Ignoring non-text frame");
                    continue;
                }
                Err(e) => Some(Err(AppError::with_source(
                    ErrorKind::Transport,
                    "WebSocket receive failed",
                    e,
                ))),
            };
        }
    }
}
