//! # LiveWire Traits
//!
//! The seams of the connection manager:
//!
//! - **Connector / Transport**: open and drive the underlying channel
//! - **CredentialSource**: supply the bearer token
//! - **ReconnectionStrategy**: bound automatic reconnection
//! - **Subscriber**: consume application messages

pub mod credential;
pub mod error;
pub mod reconnect;
pub mod subscriber;
pub mod transport;

// Re-export commonly used types
pub use credential::{CredentialSource, NoCredential, StaticToken};
pub use error::{LiveWireError, Result};
pub use reconnect::{FixedDelay, NeverReconnect, ReconnectionStrategy};
pub use subscriber::{Subscriber, SubscriptionId};
pub use transport::{Connector, Transport, WsMessage};
