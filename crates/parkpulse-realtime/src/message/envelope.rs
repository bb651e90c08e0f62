//! Inbound frame classification.
//!
//! Every text frame is parsed once and routed by its `type` tag. The client
//! interprets only the liveness reply; everything else passes through to
//! subscribers unexamined.

use serde_json::Value;

use parkpulse_core::{AppError, AppResult};

use super::types::{MessageKind, RealtimeMessage};

/// A classified inbound frame.
#[derive(Debug, Clone)]
pub enum InboundFrame {
    /// Liveness reply; consumed by the heartbeat clock, never forwarded.
    Pong,
    /// Any other well-formed message, forwarded verbatim to subscribers.
    Message(RealtimeMessage),
}

/// Parse and classify a raw text frame.
///
/// A malformed frame (invalid JSON, missing or non-string `type` tag) is a
/// [`Protocol`](parkpulse_core::error::ErrorKind::Protocol) error; the
/// caller logs and drops it without closing the connection.
pub fn classify(raw: &str) -> AppResult<InboundFrame> {
    let payload: Value = serde_json::from_str(raw)
        .map_err(|e| AppError::protocol(format!("Malformed frame: {e}")))?;

    let tag = payload
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::protocol("Frame missing string 'type' tag"))?;

    let kind = match tag {
        "pong" => return Ok(InboundFrame::Pong),
        "status" => MessageKind::Status,
        "welcome" => MessageKind::Welcome,
        "error" => MessageKind::Error,
        event => MessageKind::Event(event.to_string()),
    };

    Ok(InboundFrame::Message(RealtimeMessage { kind, payload }))
}
