//! Live feed configuration
//!
//! The YAML file describes the channel; the bearer credential never lives
//! in it and is read from the environment (or `.env`) instead.

use livewire::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable holding the bearer credential
pub const TOKEN_ENV_VAR: &str = "LIVE_FEED_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration of the `live_feed` binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveFeedConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between status lines
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,

    pub connection: ConnectionConfig,

    /// Bearer credential from the environment (not in YAML)
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_status_interval_secs() -> u64 {
    30
}

impl LiveFeedConfig {
    /// Load configuration from YAML file and .env
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config = Self::from_yaml(&yaml_content)?;

        // Don't fail if .env doesn't exist
        dotenv::dotenv().ok();

        config.token = std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|token| !token.trim().is_empty());
        if config.token.is_none() {
            warn!("{} not set, the feed will stay disconnected", TOKEN_ENV_VAR);
        }

        Ok(config)
    }

    /// Parse and validate YAML content, without touching the environment
    pub fn from_yaml(yaml_content: &str) -> Result<Self> {
        let config: LiveFeedConfig = serde_yaml::from_str(yaml_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.status_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "status_interval_secs must be greater than 0".to_string(),
            ));
        }

        self.connection
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Log configuration summary
    pub fn log(&self) {
        let connection = &self.connection;
        info!("Configuration loaded:");
        info!("  Target: {}", connection.target);
        if let Some(origin) = &connection.origin {
            info!("  Origin: {}", origin);
        }
        info!(
            "  Reconnect: {} attempts every {} ms",
            connection.reconnect_attempts, connection.reconnect_interval_ms
        );
        info!(
            "  Heartbeat: every {} ms, timeout {} ms, {} misses allowed",
            connection.heartbeat.interval_ms,
            connection.heartbeat.timeout_ms,
            connection.heartbeat.missed_pong_threshold
        );
        info!("  Log level: {}", self.log_level);
        info!("  Credential: {}", if self.token.is_some() { "set" } else { "missing" });
    }
}
