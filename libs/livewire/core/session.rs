//! Connection session and bounded reconnection
//!
//! [`ConnectionSession`] is the handle; the work happens on one spawned
//! driver task per `connect()` call:
//!
//! ```text
//! connect() ──> driver task
//!                 loop {
//!                   Session::new(attempt).run()   // fresh session per attempt
//!                     Connecting ─> Open ─> (frames, pings, sends) ─> Closing ─> Closed
//!                   attempt < cap ?  sleep(reconnect_interval), attempt += 1
//!                                 :  stay Closed, exit
//!                 }
//! ```
//!
//! Everything a session owns (transport, heartbeat timers, outbound
//! channel) lives on the driver task and is dropped when the session ends,
//! so no timer can fire against a closed session.

use crate::core::config::ConnectionConfig;
use crate::core::connection_state::{AtomicMetrics, AtomicSessionState, SessionState};
use crate::core::heartbeat::{HeartbeatMonitor, HeartbeatSignal};
use crate::core::message::Message;
use crate::core::router::{MessageRouter, Routed};
use crate::core::target::{build_address, redacted};
use crate::traits::{Connector, LiveWireError, ReconnectionStrategy, Transport, WsMessage};
use crossbeam_channel::{Sender, TrySendError};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

/// Connection lifecycle events, for status indicators and diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A handshake is starting (reconnect attempts used so far)
    Connecting(usize),
    /// The channel is open
    Connected,
    /// An open channel closed
    Disconnected,
    /// A reconnect was scheduled (attempt number, starting at 1)
    Reconnecting(usize),
    /// A ping went unanswered (consecutive misses)
    HeartbeatMissed(u32),
    /// Too many consecutive misses; the transport is being closed
    HeartbeatTimeout,
    /// A pong arrived after misses
    HeartbeatRestored,
    /// Reconnect budget spent; the session stays closed
    ReconnectExhausted,
}

/// State one driver shares with the handle that spawned it
#[derive(Default)]
struct SessionShared {
    state: AtomicSessionState,
    attempt_count: AtomicUsize,
    /// Present only while the session is Open
    outbound: RwLock<Option<mpsc::UnboundedSender<WsMessage>>>,
}

/// Handle to a connection and its retry policy
///
/// `connect`, `send` and `close` never block and never fail from the
/// caller's point of view; outcomes show up in [`Self::state`], the event
/// stream, and subscriber callbacks.
pub struct ConnectionSession {
    config: Arc<ConnectionConfig>,
    connector: Arc<dyn Connector>,
    router: Arc<MessageRouter>,
    metrics: Arc<AtomicMetrics>,
    event_tx: Sender<ConnectionEvent>,
    shared: Arc<SessionShared>,
    shutdown_tx: Option<watch::Sender<bool>>,
    task_handle: Option<JoinHandle<()>>,
}

impl ConnectionSession {
    pub fn new(
        config: Arc<ConnectionConfig>,
        connector: Arc<dyn Connector>,
        router: Arc<MessageRouter>,
        metrics: Arc<AtomicMetrics>,
        event_tx: Sender<ConnectionEvent>,
    ) -> Self {
        Self {
            config,
            connector,
            router,
            metrics,
            event_tx,
            shared: Arc::new(SessionShared::default()),
            shutdown_tx: None,
            task_handle: None,
        }
    }

    /// Open a channel to `target`, authenticated with `credential`
    ///
    /// Without a non-empty credential this is a no-op: no attempt is made and
    /// no retry is scheduled. The same holds for a config that fails
    /// [`ConnectionConfig::validate`]. A call while a driver is running
    /// replaces it and starts again from attempt 0.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&mut self, target: &str, credential: Option<&str>) {
        if let Err(e) = self.config.validate() {
            error!("Cannot connect: {}", e);
            return;
        }

        let credential = match credential.map(str::trim).filter(|c| !c.is_empty()) {
            Some(credential) => credential,
            None => {
                debug!("No credential available, not connecting to {}", target);
                return;
            }
        };

        let address = match build_address(target, self.config.origin.as_deref(), credential) {
            Ok(address) => address,
            Err(e) => {
                error!("Cannot connect: {}", e);
                return;
            }
        };

        self.stop_driver();

        let shared = Arc::new(SessionShared::default());
        shared.state.set(SessionState::Connecting);
        self.shared = Arc::clone(&shared);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown_tx = Some(shutdown_tx);

        let driver = Driver {
            strategy: self.config.reconnect_strategy(),
            config: Arc::clone(&self.config),
            connector: Arc::clone(&self.connector),
            router: Arc::clone(&self.router),
            metrics: Arc::clone(&self.metrics),
            events: self.event_tx.clone(),
            shared,
            shutdown: shutdown_rx,
            address,
        };

        self.task_handle = Some(tokio::spawn(driver.run()));
    }

    /// Send an application message
    ///
    /// Delivered if and only if the session is Open; otherwise dropped.
    /// Reserved control types cannot be sent. Returns whether the message
    /// was handed to the transport.
    pub fn send(&self, kind: &str, payload: Value) -> bool {
        let message = Message::new(kind, payload);
        if message.is_control() {
            warn!("Refusing to send reserved message type '{}'", kind);
            self.metrics.increment_dropped();
            return false;
        }

        let outbound = self.shared.outbound.read();
        let sender = match outbound.as_ref() {
            Some(sender) if self.shared.state.is_open() => sender,
            _ => {
                debug!("Session not open, dropping '{}'", kind);
                self.metrics.increment_dropped();
                return false;
            }
        };

        let frame = match message.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode '{}': {}", kind, e);
                self.metrics.increment_dropped();
                return false;
            }
        };

        if sender.send(frame).is_err() {
            self.metrics.increment_dropped();
            return false;
        }
        true
    }

    /// Close the channel and disable reconnection for this close. Idempotent
    pub fn close(&mut self) {
        if self.stop_driver() {
            info!("Connection session closed by caller");
        }
    }

    /// Close and wait until the driver task has released every resource
    pub async fn shutdown(mut self) {
        self.stop_driver();
        if let Some(handle) = self.task_handle.take() {
            let _ = handle.await;
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.shared.state.get()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.shared.state.is_open()
    }

    /// Reconnect attempts used since the last successful open
    pub fn attempt_count(&self) -> usize {
        self.shared.attempt_count.load(Ordering::Acquire)
    }

    /// Signal the running driver, if any. Returns whether one was signalled
    fn stop_driver(&mut self) -> bool {
        let Some(shutdown_tx) = self.shutdown_tx.take() else {
            return false;
        };

        let _ = shutdown_tx.send(true);
        if self.shared.state.is_active() {
            self.shared.state.set(SessionState::Closing);
        }
        *self.shared.outbound.write() = None;
        true
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        self.stop_driver();
    }
}

/// Why a session ended
enum SessionEnd {
    /// The handshake failed or timed out
    HandshakeFailed(String),
    /// An open transport closed or failed
    Closed(String),
    /// The heartbeat declared the transport dead
    HeartbeatTimeout,
    /// The caller closed the session
    Shutdown,
}

/// Retry loop; owns everything a running connection needs
struct Driver {
    config: Arc<ConnectionConfig>,
    connector: Arc<dyn Connector>,
    router: Arc<MessageRouter>,
    metrics: Arc<AtomicMetrics>,
    events: Sender<ConnectionEvent>,
    shared: Arc<SessionShared>,
    shutdown: watch::Receiver<bool>,
    strategy: Box<dyn ReconnectionStrategy>,
    address: Url,
}

impl Driver {
    async fn run(mut self) {
        info!("Connecting to {}", redacted(&self.address));

        loop {
            let attempt = self.shared.attempt_count.load(Ordering::Acquire);
            let end = Session::new(attempt).run(&mut self).await;

            match end {
                SessionEnd::Shutdown => {
                    debug!("Session shut down by caller");
                    break;
                }
                SessionEnd::HandshakeFailed(reason) | SessionEnd::Closed(reason) => {
                    debug!("Session ended: {}", reason)
                }
                SessionEnd::HeartbeatTimeout => debug!("Session ended: heartbeat timeout"),
            }

            let used = self.shared.attempt_count.load(Ordering::Acquire);
            match self.strategy.next_delay(used) {
                Some(delay) => {
                    let next = used + 1;
                    self.shared.attempt_count.store(next, Ordering::Release);
                    self.metrics.increment_reconnects();
                    self.emit(ConnectionEvent::Reconnecting(next));
                    info!("Reconnecting in {:?} (attempt {})", delay, next);

                    tokio::select! {
                        biased;
                        _ = shutdown_requested(&mut self.shutdown) => {
                            debug!("Shutdown requested during reconnection delay");
                            break;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => {
                    warn!(
                        "Reconnection budget exhausted after {} attempts, staying closed",
                        used
                    );
                    self.emit(ConnectionEvent::ReconnectExhausted);
                    break;
                }
            }
        }

        *self.shared.outbound.write() = None;
        self.shared.state.set(SessionState::Closed);
        debug!("Connection driver exiting");
    }

    fn transition(&self, to: SessionState) {
        let from = self.shared.state.get();
        if from != to {
            debug!("Session state {:?} -> {:?}", from, to);
            self.shared.state.set(to);
        }
    }

    fn emit(&self, event: ConnectionEvent) {
        // Nobody draining the stream must not grow memory without bound
        if let Err(TrySendError::Full(event)) = self.events.try_send(event) {
            debug!("Event channel full, dropping {:?}", event);
        }
    }
}

/// One connection attempt
struct Session {
    attempt: usize,
    heartbeat: Option<HeartbeatMonitor>,
}

impl Session {
    fn new(attempt: usize) -> Self {
        Self {
            attempt,
            heartbeat: None,
        }
    }

    async fn run(mut self, driver: &mut Driver) -> SessionEnd {
        driver.transition(SessionState::Connecting);
        driver.emit(ConnectionEvent::Connecting(self.attempt));

        let connect = tokio::time::timeout(
            driver.config.connect_timeout(),
            driver.connector.connect(driver.address.as_str()),
        );

        let mut transport = tokio::select! {
            biased;
            _ = shutdown_requested(&mut driver.shutdown) => return SessionEnd::Shutdown,
            result = connect => match result {
                Ok(Ok(transport)) => transport,
                Ok(Err(e)) => {
                    warn!("Failed to connect (attempt {}): {}", self.attempt, e);
                    driver.transition(SessionState::Closed);
                    return SessionEnd::HandshakeFailed(e.to_string());
                }
                Err(_) => {
                    let e = LiveWireError::Timeout(format!(
                        "handshake exceeded {:?}",
                        driver.config.connect_timeout()
                    ));
                    warn!("Failed to connect (attempt {}): {}", self.attempt, e);
                    driver.transition(SessionState::Closed);
                    return SessionEnd::HandshakeFailed(e.to_string());
                }
            }
        };

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
        let mut heartbeat = HeartbeatMonitor::new(&driver.config.heartbeat, outbound_tx.clone());

        *driver.shared.outbound.write() = Some(outbound_tx);
        driver.shared.attempt_count.store(0, Ordering::Release);
        driver.transition(SessionState::Open);
        driver.emit(ConnectionEvent::Connected);
        info!("Connected to {}", redacted(&driver.address));

        heartbeat.start();
        self.heartbeat = Some(heartbeat);

        let end = self.message_loop(driver, &mut transport, &mut outbound_rx).await;

        // Teardown: timers first, then the send capability, then the socket
        if let Some(heartbeat) = self.heartbeat.as_mut() {
            heartbeat.stop();
        }
        *driver.shared.outbound.write() = None;
        outbound_rx.close();

        if !matches!(end, SessionEnd::Closed(_)) {
            driver.transition(SessionState::Closing);
        }
        transport.close().await;
        driver.transition(SessionState::Closed);
        driver.emit(ConnectionEvent::Disconnected);
        info!("Disconnected from {}", redacted(&driver.address));

        end
    }

    async fn message_loop(
        &mut self,
        driver: &mut Driver,
        transport: &mut Box<dyn Transport>,
        outbound_rx: &mut mpsc::UnboundedReceiver<WsMessage>,
    ) -> SessionEnd {
        let Some(heartbeat) = self.heartbeat.as_mut() else {
            return SessionEnd::Closed("heartbeat not started".into());
        };

        // Timers and writes are polled before reads so a peer that never
        // stops sending cannot hold back pings or queued frames
        loop {
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut driver.shutdown) => {
                    debug!("Shutdown requested, closing transport");
                    return SessionEnd::Shutdown;
                }

                _ = heartbeat.expired() => {
                    match heartbeat.fire(Instant::now()) {
                        Some(HeartbeatSignal::Missed(missed)) => {
                            driver.emit(ConnectionEvent::HeartbeatMissed(missed));
                        }
                        Some(HeartbeatSignal::TimedOut) => {
                            driver.emit(ConnectionEvent::HeartbeatTimeout);
                            warn!("Heartbeat timed out, forcing transport closed");
                            return SessionEnd::HeartbeatTimeout;
                        }
                        Some(HeartbeatSignal::Restored) | None => {}
                    }
                }

                Some(frame) = outbound_rx.recv() => {
                    if let Err(e) = transport.send(frame).await {
                        warn!("Failed to write frame: {}", e);
                        return SessionEnd::Closed(e.to_string());
                    }
                    driver.metrics.increment_sent();
                }

                frame = transport.recv() => {
                    match frame {
                        Some(Ok(frame)) => {
                            driver.metrics.increment_received();
                            match driver.router.route(&frame, heartbeat) {
                                Routed::Malformed => driver.metrics.increment_malformed(),
                                Routed::Pong(signal) => {
                                    if let Some(latency) = heartbeat.last_latency() {
                                        driver.metrics.record_latency(latency);
                                    }
                                    if let Some(HeartbeatSignal::Restored) = signal {
                                        driver.emit(ConnectionEvent::HeartbeatRestored);
                                    }
                                }
                                Routed::Delivered(_) | Routed::Ignored => {}
                            }
                        }
                        Some(Err(e)) => {
                            // The close that follows drives recovery
                            debug!("Transport error: {}", e);
                        }
                        None => {
                            warn!("Connection closed by peer");
                            return SessionEnd::Closed("stream ended".into());
                        }
                    }
                }
            }
        }
    }
}

/// Resolve once the session handle asked for shutdown or went away
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
