//! WebSocket transport over tokio-tungstenite

use crate::traits::{Connector, LiveWireError, Result, Transport, WsMessage};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

/// Opens WebSocket transports with `tokio_tungstenite::connect_async`
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, address: &str) -> Result<Box<dyn Transport>> {
        let (stream, response) = connect_async(address)
            .await
            .map_err(|e| LiveWireError::WebSocket(e.to_string()))?;

        debug!("WebSocket handshake completed with status {}", response.status());

        Ok(Box::new(TungsteniteTransport {
            stream,
            closed: false,
        }))
    }
}

/// An open tokio-tungstenite stream
pub struct TungsteniteTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

#[async_trait]
impl Transport for TungsteniteTransport {
    async fn send(&mut self, message: WsMessage) -> Result<()> {
        if self.closed {
            return Err(LiveWireError::ConnectionClosed("send on closed transport".into()));
        }
        self.stream
            .send(ws_message_to_tungstenite(message))
            .await
            .map_err(|e| LiveWireError::WebSocket(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<WsMessage>> {
        if self.closed {
            return None;
        }

        // Protocol-level ping/pong frames are answered by tungstenite itself
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(WsMessage::Text(text))),
                Some(Ok(Message::Binary(data))) => return Some(Ok(WsMessage::Binary(data))),
                Some(Ok(Message::Close(frame))) => {
                    debug!("Close frame received: {:?}", frame);
                    self.closed = true;
                    return None;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(e)) => {
                    self.closed = true;
                    return Some(Err(LiveWireError::WebSocket(e.to_string())));
                }
                None => {
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.stream.close(None).await {
            debug!("Error while closing WebSocket: {}", e);
        }
    }
}

/// Convert WsMessage to tungstenite Message
fn ws_message_to_tungstenite(msg: WsMessage) -> Message {
    match msg {
        WsMessage::Text(text) => Message::Text(text),
        WsMessage::Binary(data) => Message::Binary(data),
    }
}
