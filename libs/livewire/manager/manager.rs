use crate::core::{
    AtomicMetrics, ConnectionConfig, ConnectionEvent, ConnectionSession, Message, MessageRouter,
    Metrics, SessionState,
};
use crate::traits::{Connector, CredentialSource, Subscriber, SubscriptionId};
use crossbeam_channel::{Receiver, Sender};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// The one entry point application code touches
///
/// Owns the message router (and with it every subscription) for its whole
/// life, and a connection session that is replaced whenever the target or
/// the credential changes. A live session is never re-targeted.
///
/// Nothing here returns transport errors: callers watch [`Self::is_connected`]
/// and, if they care, the event stream.
///
/// # Example
/// ```ignore
/// let mut manager = ConnectionManager::builder(ConnectionConfig::new("/ws").with_origin(origin))
///     .credentials(Arc::new(StaticToken::new(token)))
///     .on_message(|message: &Message| info!("{}", message.kind))
///     .build()?;
///
/// manager.start().await;
/// manager.send_message("case.watch", json!({ "case_id": 42 }));
/// ```
pub struct ConnectionManager {
    config: Arc<ConnectionConfig>,
    connector: Arc<dyn Connector>,
    credentials: Arc<dyn CredentialSource>,
    router: Arc<MessageRouter>,
    metrics: Arc<AtomicMetrics>,
    event_tx: Sender<ConnectionEvent>,
    event_rx: Receiver<ConnectionEvent>,
    session: ConnectionSession,
    credential: Option<String>,
}

impl ConnectionManager {
    pub fn builder(config: ConnectionConfig) -> super::ConnectionManagerBuilder {
        super::ConnectionManagerBuilder::new(config)
    }

    pub(crate) fn from_parts(
        config: ConnectionConfig,
        connector: Arc<dyn Connector>,
        credentials: Arc<dyn CredentialSource>,
        on_message: Option<Arc<dyn Subscriber>>,
        event_capacity: usize,
    ) -> Self {
        let config = Arc::new(config);
        let router = Arc::new(MessageRouter::new());
        let metrics = Arc::new(AtomicMetrics::new());
        let (event_tx, event_rx) = crossbeam_channel::bounded(event_capacity);

        if let Some(subscriber) = on_message {
            router.subscribe_arc(subscriber);
        }

        let session = ConnectionSession::new(
            Arc::clone(&config),
            Arc::clone(&connector),
            Arc::clone(&router),
            Arc::clone(&metrics),
            event_tx.clone(),
        );

        Self {
            config,
            connector,
            credentials,
            router,
            metrics,
            event_tx,
            event_rx,
            session,
            credential: None,
        }
    }

    /// Read the credential source and connect
    pub async fn start(&mut self) {
        self.credential = self.credentials.bearer_token().await;
        self.replace_session();
    }

    /// Re-read the credential source; reconnect only if the token changed
    pub async fn refresh_credential(&mut self) {
        let token = self.credentials.bearer_token().await;
        self.set_credential(token);
    }

    /// Use `credential` from now on
    ///
    /// A different value tears the current session down and starts a fresh
    /// one from attempt 0. `None` leaves the manager disconnected.
    pub fn set_credential(&mut self, credential: Option<String>) {
        if credential == self.credential {
            debug!("Credential unchanged, keeping current session");
            return;
        }
        info!(
            "Credential {}, recreating session",
            if credential.is_some() { "changed" } else { "cleared" }
        );
        self.credential = credential;
        self.replace_session();
    }

    /// Point the channel at a new target
    pub fn set_target(&mut self, target: impl Into<String>) {
        let target = target.into();
        if target == self.config.target {
            return;
        }
        info!("Target changed to {}, recreating session", target);

        let mut config = (*self.config).clone();
        config.target = target;
        self.config = Arc::new(config);
        self.replace_session();
    }

    /// Start over from attempt 0 with the current target and credential
    ///
    /// This is the external trigger that revives a session whose reconnect
    /// budget is spent.
    pub fn reconnect(&mut self) {
        info!("Reconnect requested");
        self.replace_session();
    }

    /// True while the current session is Open
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.session.is_open()
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Reconnect attempts used by the current session since it last opened
    pub fn attempt_count(&self) -> usize {
        self.session.attempt_count()
    }

    /// Most recent application message
    pub fn last_message(&self) -> Option<Message> {
        self.router.last_message()
    }

    /// Send an application message; dropped unless connected
    pub fn send_message(&self, kind: &str, payload: Value) -> bool {
        self.session.send(kind, payload)
    }

    pub fn subscribe(&self, subscriber: impl Subscriber) -> SubscriptionId {
        self.router.subscribe(subscriber)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.router.unsubscribe(id)
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot(self.session.state())
    }

    /// Try to receive a connection event (non-blocking)
    pub fn try_recv_event(&self) -> Option<ConnectionEvent> {
        self.event_rx.try_recv().ok()
    }

    /// A receiver for the connection event stream
    pub fn events(&self) -> Receiver<ConnectionEvent> {
        self.event_rx.clone()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Close the channel without reconnecting. Idempotent
    pub fn close(&mut self) {
        self.session.close();
    }

    /// Close and wait for the session task to release its resources
    pub async fn shutdown(mut self) {
        info!("Shutting down connection manager");
        let session = self.take_session();
        session.shutdown().await;
    }

    fn new_session(&self) -> ConnectionSession {
        ConnectionSession::new(
            Arc::clone(&self.config),
            Arc::clone(&self.connector),
            Arc::clone(&self.router),
            Arc::clone(&self.metrics),
            self.event_tx.clone(),
        )
    }

    fn take_session(&mut self) -> ConnectionSession {
        let fresh = self.new_session();
        std::mem::replace(&mut self.session, fresh)
    }

    fn replace_session(&mut self) {
        let mut old = self.take_session();
        old.close();
        drop(old);

        let target = self.config.target.clone();
        self.session.connect(&target, self.credential.as_deref());
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.session.close();
    }
}
