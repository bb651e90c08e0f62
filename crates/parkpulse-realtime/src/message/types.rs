//! Frame type definitions for the realtime channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames the client originates itself.
///
/// Domain commands are not listed here: callers of `send` supply their own
/// payloads, which pass through opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Liveness probe.
    Ping,
    /// Status query, sent immediately after the channel opens.
    Status,
}

impl OutboundFrame {
    /// Serialize to the wire representation.
    pub fn to_json(&self) -> String {
        // Unit variants with a static tag cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Kind of a well-formed inbound message, derived from its `type` tag.
///
/// Liveness replies (`pong`) are not represented here: they are consumed by
/// the dispatcher and never surface to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Server status snapshot (`{"type":"status", "data": ...}`).
    Status,
    /// Greeting sent on connect (`{"type":"welcome", "message": ...}`).
    Welcome,
    /// Server-reported error (`{"type":"error", "message": ...}`).
    Error,
    /// Domain event (vehicle entry/exit, parking-record change, ...);
    /// carries the event name from the `type` tag.
    Event(String),
}

impl MessageKind {
    /// The original `type` tag value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Status => "status",
            Self::Welcome => "welcome",
            Self::Error => "error",
            Self::Event(name) => name,
        }
    }
}

/// A well-formed inbound message as delivered to subscribers.
///
/// `payload` is the complete frame verbatim, `type` tag included, so
/// consumers can switch on event kind or re-serialize untouched. Constructed
/// by the dispatcher on frame arrival, immutable, handed to subscribers,
/// then discarded — the client retains only the most recent one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeMessage {
    /// Classified message kind.
    pub kind: MessageKind,
    /// The full frame as received.
    pub payload: Value,
}

impl RealtimeMessage {
    /// The `data` field of the frame, if present.
    pub fn data(&self) -> Option<&Value> {
        self.payload.get("data")
    }

    /// The `message` field of the frame, if present (welcome/error frames).
    pub fn message(&self) -> Option<&str> {
        self.payload.get("message").and_then(Value::as_str)
    }
}
