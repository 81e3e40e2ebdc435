use thiserror::Error;

/// Main error type for livewire
#[derive(Error, Debug)]
pub enum LiveWireError {
    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connection closed by the peer or the network
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Channel target could not be turned into a transport address
    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// Frame (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Result type for livewire operations
pub type Result<T> = std::result::Result<T, LiveWireError>;
