use super::ConnectionManager;
use crate::core::{ConnectionConfig, TungsteniteConnector};
use crate::traits::{Connector, CredentialSource, NoCredential, Result, Subscriber};
use std::sync::Arc;

/// Events buffered before the oldest undrained ones start being dropped
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Builder for [`ConnectionManager`]
///
/// Only the config is required. Without a connector the manager talks
/// WebSocket through tokio-tungstenite; without a credential source it
/// never connects until [`ConnectionManager::set_credential`] is called.
pub struct ConnectionManagerBuilder {
    config: ConnectionConfig,
    connector: Option<Arc<dyn Connector>>,
    credentials: Option<Arc<dyn CredentialSource>>,
    on_message: Option<Arc<dyn Subscriber>>,
    event_capacity: usize,
}

impl ConnectionManagerBuilder {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            connector: None,
            credentials: None,
            on_message: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Replace the transport (in-memory connectors in tests)
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Subscriber registered before any other, so it always runs first
    pub fn on_message(mut self, subscriber: impl Subscriber) -> Self {
        self.on_message = Some(Arc::new(subscriber));
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Validate the config and build the manager
    ///
    /// The manager starts Idle; call [`ConnectionManager::start`] to connect.
    pub fn build(self) -> Result<ConnectionManager> {
        self.config.validate()?;

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(TungsteniteConnector));
        let credentials = self
            .credentials
            .unwrap_or_else(|| Arc::new(NoCredential));

        Ok(ConnectionManager::from_parts(
            self.config,
            connector,
            credentials,
            self.on_message,
            self.event_capacity,
        ))
    }
}
