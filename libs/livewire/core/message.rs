//! Wire envelope
//!
//! Every frame on the channel is a JSON object
//! `{ "type": "<string>", "payload": <any JSON value> }`. Two types are
//! reserved for the heartbeat: `ping` (outbound) and `pong` (inbound).
//! Everything else belongs to the application and is passed through untouched.

use crate::traits::{Result, WsMessage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved type of outbound heartbeat frames
pub const PING_TYPE: &str = "ping";

/// Reserved type of inbound heartbeat replies
pub const PONG_TYPE: &str = "pong";

/// Inbound or outbound envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

/// Payload of a `ping` frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingPayload {
    /// Epoch milliseconds at send time
    pub timestamp: i64,
    /// Per-session sequence number, starting at 1
    pub sequence: u64,
}

/// Payload of a `pong` frame, echoing the ping timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PongPayload {
    pub timestamp: i64,
}

impl Message {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Build a heartbeat ping
    pub fn ping(sequence: u64, timestamp: i64) -> Result<Self> {
        let payload = serde_json::to_value(PingPayload { timestamp, sequence })?;
        Ok(Self::new(PING_TYPE, payload))
    }

    /// Build a heartbeat reply echoing `timestamp`
    pub fn pong(timestamp: i64) -> Result<Self> {
        let payload = serde_json::to_value(PongPayload { timestamp })?;
        Ok(Self::new(PONG_TYPE, payload))
    }

    /// Check if this is a reserved control message
    pub fn is_control(&self) -> bool {
        self.kind == PING_TYPE || self.kind == PONG_TYPE
    }

    pub fn is_pong(&self) -> bool {
        self.kind == PONG_TYPE
    }

    /// Payload of a ping, if this is a well-formed one
    pub fn ping_payload(&self) -> Option<PingPayload> {
        if self.kind != PING_TYPE {
            return None;
        }
        PingPayload::deserialize(&self.payload).ok()
    }

    /// Timestamp echoed by a pong, if the payload carries one
    pub fn pong_timestamp(&self) -> Option<i64> {
        PongPayload::deserialize(&self.payload)
            .ok()
            .map(|pong| pong.timestamp)
    }

    /// Encode as a text frame
    pub fn to_frame(&self) -> Result<WsMessage> {
        Ok(WsMessage::Text(serde_json::to_string(self)?))
    }

    /// Decode a text or binary frame
    pub fn from_frame(frame: &WsMessage) -> Result<Self> {
        Ok(serde_json::from_slice(frame.as_bytes())?)
    }
}

/// Current wall-clock time in epoch milliseconds
pub fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
