use crate::error::Result;
use async_trait::async_trait;

/// A frame on the wire. Can be Text or Binary data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
}

impl WsMessage {
    /// Get the frame as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            WsMessage::Text(s) => Some(s),
            WsMessage::Binary(_) => None,
        }
    }

    /// Get the frame payload as bytes, whatever its kind
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            WsMessage::Text(s) => s.as_bytes(),
            WsMessage::Binary(b) => b,
        }
    }

    /// Check if frame is text
    pub fn is_text(&self) -> bool {
        matches!(self, WsMessage::Text(_))
    }
}

/// An open, message-oriented bidirectional channel
///
/// A transport is exclusively owned by the session that opened it. Nothing
/// outside the session touches it; the heartbeat only gets a send capability.
///
/// `recv` is polled inside `tokio::select!` and must be cancel-safe:
/// dropping an unfinished `recv` future must not lose a frame.
#[async_trait]
pub trait Transport: Send {
    /// Write a frame to the peer
    async fn send(&mut self, message: WsMessage) -> Result<()>;

    /// Wait for the next data frame
    ///
    /// # Returns
    /// * `Some(Ok(frame))` - A frame arrived
    /// * `Some(Err(e))` - Transport error; a close follows
    /// * `None` - The channel is closed
    async fn recv(&mut self) -> Option<Result<WsMessage>>;

    /// Close the channel. Must be safe to call on an already closed channel
    async fn close(&mut self);
}

/// Opens transports
///
/// Production code uses [`crate::core::TungsteniteConnector`]; tests plug in
/// scripted in-memory connectors.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Perform the handshake against `address` and return the open transport
    async fn connect(&self, address: &str) -> Result<Box<dyn Transport>>;
}
