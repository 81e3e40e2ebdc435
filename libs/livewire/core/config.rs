use crate::traits::{FixedDelay, LiveWireError, NeverReconnect, ReconnectionStrategy, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Heartbeat timing
///
/// A ping is sent every `interval_ms`; a ping left unanswered for
/// `timeout_ms` is a missed pong; `missed_pong_threshold` consecutive misses
/// declare the connection dead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    pub interval_ms: u64,
    pub timeout_ms: u64,
    pub missed_pong_threshold: u32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            timeout_ms: 5_000,
            missed_pong_threshold: 3,
        }
    }
}

impl HeartbeatConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Configuration of one logical channel
///
/// # Example
/// ```ignore
/// let config = ConnectionConfig::new("/ws")
///     .with_origin("https://dashboard.example.com")
///     .with_reconnect(2, Duration::from_secs(1));
/// config.validate()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Absolute address (`wss://host/ws`) or path relative to `origin` (`/ws`)
    pub target: String,

    /// Hosting origin used to resolve relative targets (`https://host`)
    #[serde(default)]
    pub origin: Option<String>,

    /// Max consecutive automatic reconnects before giving up
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: usize,

    /// Fixed delay between reconnect attempts
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    /// Bound on a single handshake; a slower handshake counts as a failed attempt
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

fn default_reconnect_attempts() -> usize {
    5
}

fn default_reconnect_interval_ms() -> u64 {
    3_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl ConnectionConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            origin: None,
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            heartbeat: HeartbeatConfig::default(),
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_reconnect(mut self, attempts: usize, interval: Duration) -> Self {
        self.reconnect_attempts = attempts;
        self.reconnect_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_heartbeat(mut self, interval: Duration, timeout: Duration) -> Self {
        self.heartbeat.interval_ms = interval.as_millis() as u64;
        self.heartbeat.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Reconnection policy described by this config
    ///
    /// `reconnect_attempts == 0` means the session stays closed after its
    /// first failure or drop.
    pub fn reconnect_strategy(&self) -> Box<dyn ReconnectionStrategy> {
        if self.reconnect_attempts == 0 {
            Box::new(NeverReconnect)
        } else {
            Box::new(FixedDelay::new(self.reconnect_interval(), self.reconnect_attempts))
        }
    }

    /// Reject configurations the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(LiveWireError::Configuration("target must not be empty".into()));
        }
        if self.heartbeat.interval_ms == 0 {
            return Err(LiveWireError::Configuration(
                "heartbeat.interval_ms must be greater than 0".into(),
            ));
        }
        if self.heartbeat.timeout_ms == 0 || self.heartbeat.timeout_ms >= self.heartbeat.interval_ms {
            return Err(LiveWireError::Configuration(format!(
                "heartbeat.timeout_ms ({}) must be between 1 and heartbeat.interval_ms ({})",
                self.heartbeat.timeout_ms, self.heartbeat.interval_ms
            )));
        }
        if self.heartbeat.missed_pong_threshold == 0 {
            return Err(LiveWireError::Configuration(
                "heartbeat.missed_pong_threshold must be at least 1".into(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(LiveWireError::Configuration(
                "connect_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
