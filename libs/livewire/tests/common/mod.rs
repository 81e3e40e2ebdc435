//! Common test utilities for LiveWire integration tests
//!
//! - [`ScriptedConnector`]: in-memory transports with a per-attempt script,
//!   for driving sessions under tokio's paused clock
//! - [`MockWsServer`]: a real WebSocket server answering JSON pings

#![allow(dead_code)]

use async_trait::async_trait;
use livewire::core::{ConnectionConfig, ConnectionEvent, Message};
use livewire::traits::{Connector, LiveWireError, Result, Transport, WsMessage};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

pub const ORIGIN: &str = "https://dashboard.example.com";

/// `/ws` on [`ORIGIN`] with the given reconnect policy and default heartbeat
pub fn dashboard_config(attempts: usize, interval_ms: u64) -> ConnectionConfig {
    ConnectionConfig::new("/ws")
        .with_origin(ORIGIN)
        .with_reconnect(attempts, Duration::from_millis(interval_ms))
}

/// Let spawned tasks run; under a paused clock this also advances time by `ms`
pub async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Drain every event currently buffered
pub fn drain_events(rx: &crossbeam_channel::Receiver<ConnectionEvent>) -> Vec<ConnectionEvent> {
    rx.try_iter().collect()
}

/// What the connector does on one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handshake fails immediately
    Fail,
    /// Handshake succeeds; the peer never answers pings on its own
    Open,
    /// Handshake succeeds; the peer answers every ping with a pong
    OpenAutoPong,
    /// Handshake never completes
    Hang,
}

/// Connector following a script, one outcome per attempt
///
/// Once the script is used up every further attempt gets the fallback
/// outcome.
pub struct ScriptedConnector {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    attempts: Mutex<Vec<(String, Instant)>>,
    peers: Mutex<Vec<Arc<MockPeer>>>,
}

impl ScriptedConnector {
    pub fn new(script: impl IntoIterator<Item = Outcome>, fallback: Outcome) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            attempts: Mutex::new(Vec::new()),
            peers: Mutex::new(Vec::new()),
        })
    }

    /// Every attempt fails
    pub fn failing() -> Arc<Self> {
        Self::new([], Outcome::Fail)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.lock().len()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.attempts.lock().iter().map(|(a, _)| a.clone()).collect()
    }

    /// When each attempt started, relative to `start`
    pub fn offsets_since(&self, start: Instant) -> Vec<Duration> {
        self.attempts
            .lock()
            .iter()
            .map(|(_, at)| at.duration_since(start))
            .collect()
    }

    /// The n-th opened transport's peer
    pub fn peer(&self, n: usize) -> Arc<MockPeer> {
        Arc::clone(&self.peers.lock()[n])
    }

    pub fn opened(&self) -> usize {
        self.peers.lock().len()
    }

    fn open(&self, auto_pong: bool) -> Box<dyn Transport> {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        let peer = Arc::new(MockPeer {
            inbound: inbound_tx.clone(),
            outbound: Mutex::new(outbound_rx),
            closed: Arc::clone(&closed),
        });
        self.peers.lock().push(peer);

        Box::new(MockTransport {
            inbound: inbound_rx,
            loopback: auto_pong.then_some(inbound_tx),
            outbound: outbound_tx,
            closed,
            ended: false,
        })
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, address: &str) -> Result<Box<dyn Transport>> {
        self.attempts
            .lock()
            .push((address.to_string(), Instant::now()));
        let outcome = self.script.lock().pop_front().unwrap_or(self.fallback);

        match outcome {
            Outcome::Fail => Err(LiveWireError::WebSocket("connection refused".into())),
            Outcome::Open => Ok(self.open(false)),
            Outcome::OpenAutoPong => Ok(self.open(true)),
            Outcome::Hang => std::future::pending().await,
        }
    }
}

/// The remote end of an in-memory transport
pub struct MockPeer {
    /// `None` closes the channel
    inbound: mpsc::UnboundedSender<Option<WsMessage>>,
    outbound: Mutex<mpsc::UnboundedReceiver<WsMessage>>,
    closed: Arc<AtomicBool>,
}

impl MockPeer {
    /// Deliver an envelope to the client
    pub fn push(&self, message: Message) {
        let _ = self.inbound.send(Some(message.to_frame().unwrap()));
    }

    /// Deliver a raw text frame to the client
    pub fn push_raw(&self, text: &str) {
        let _ = self.inbound.send(Some(WsMessage::Text(text.to_string())));
    }

    /// Close the channel from the remote side
    pub fn close(&self) {
        let _ = self.inbound.send(None);
    }

    /// Every envelope the client wrote since the last call
    pub fn sent(&self) -> Vec<Message> {
        let mut outbound = self.outbound.lock();
        let mut messages = Vec::new();
        while let Ok(frame) = outbound.try_recv() {
            messages.push(Message::from_frame(&frame).unwrap());
        }
        messages
    }

    /// True once the client closed its end
    pub fn client_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

struct MockTransport {
    inbound: mpsc::UnboundedReceiver<Option<WsMessage>>,
    loopback: Option<mpsc::UnboundedSender<Option<WsMessage>>>,
    outbound: mpsc::UnboundedSender<WsMessage>,
    closed: Arc<AtomicBool>,
    ended: bool,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: WsMessage) -> Result<()> {
        if self.ended || self.closed.load(Ordering::Acquire) {
            return Err(LiveWireError::ConnectionClosed("mock transport closed".into()));
        }

        if let Some(loopback) = &self.loopback {
            let envelope = Message::from_frame(&message)?;
            if let Some(ping) = envelope.ping_payload() {
                let pong = Message::pong(ping.timestamp)?;
                let _ = loopback.send(Some(pong.to_frame()?));
            }
        }

        self.outbound
            .send(message)
            .map_err(|_| LiveWireError::ConnectionClosed("peer gone".into()))
    }

    async fn recv(&mut self) -> Option<Result<WsMessage>> {
        if self.ended {
            return None;
        }
        match self.inbound.recv().await {
            Some(Some(frame)) => Some(Ok(frame)),
            Some(None) | None => {
                self.ended = true;
                None
            }
        }
    }

    async fn close(&mut self) {
        self.ended = true;
        self.closed.store(true, Ordering::Release);
    }
}

/// A mock WebSocket server that answers JSON pings with pongs
///
/// Every other text frame is echoed back.
pub struct MockWsServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
}

impl MockWsServer {
    /// Create and start a new mock WebSocket server
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let shutdown = shutdown_clone.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, shutdown).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self { addr, shutdown }
    }

    async fn handle_connection(stream: tokio::net::TcpStream, shutdown: Arc<Notify>) {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_async;
        use tokio_tungstenite::tungstenite::Message as Frame;

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Frame::Text(text))) => {
                            let ping = serde_json::from_str::<Message>(&text)
                                .ok()
                                .and_then(|message| message.ping_payload());
                            let reply = match ping {
                                Some(ping) => {
                                    let pong = Message::pong(ping.timestamp).unwrap();
                                    serde_json::to_string(&pong).unwrap()
                                }
                                None => text,
                            };
                            if write.send(Frame::Text(reply)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Frame::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
                _ = shutdown.notified() => {
                    let _ = write.send(Frame::Close(None)).await;
                    break;
                }
            }
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
