//! # LiveWire
//!
//! Real-time channel client for the investigation dashboard: one persistent
//! WebSocket per logical channel, bearer-token authentication, heartbeat
//! liveness detection and bounded fixed-delay reconnection behind a small
//! publish/subscribe facade.
//!
//! ## Features
//!
//! - **Explicit state machine**: `Idle → Connecting → Open → Closing → Closed`
//! - **Heartbeat**: JSON ping/pong with missed-pong threshold
//! - **Bounded reconnection**: fixed delay, attempt cap, reset on open
//! - **Control isolation**: pongs never reach application subscribers
//! - **Pluggable transport**: tokio-tungstenite in production, in-memory in tests

pub mod traits;
pub mod core;
pub mod manager;

// Re-export all traits
pub use traits::*;

// Re-export core functionality
pub use crate::core::{
    config, connection_state, heartbeat, message, router, session, target,
    config::{ConnectionConfig, HeartbeatConfig},
    connection_state::{Metrics, SessionState},
    message::Message,
    session::ConnectionEvent,
    ws_transport::TungsteniteConnector,
};

// Re-export manager
pub use manager::{ConnectionManager, ConnectionManagerBuilder};
