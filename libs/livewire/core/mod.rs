//! # LiveWire core
//!
//! The connection machinery behind [`crate::ConnectionManager`]:
//!
//! - **session**: one driver task per `connect()`, a fresh session per attempt,
//!   fixed-delay bounded reconnection
//! - **heartbeat**: ping/pong liveness monitor bound to one session
//! - **router**: pong vs. application frame classification and fan-out
//! - **target**: transport address construction with the `token` parameter
//! - **ws_transport**: the tokio-tungstenite transport
//!
//! ## Example
//!
//! ```rust,ignore
//! use livewire::core::*;
//!
//! let router = Arc::new(MessageRouter::new());
//! router.subscribe(|message: &Message| println!("{}", message.kind));
//!
//! let (event_tx, _event_rx) = crossbeam_channel::unbounded();
//! let mut session = ConnectionSession::new(
//!     Arc::new(ConnectionConfig::new("wss://alerts.example.com/ws")),
//!     Arc::new(TungsteniteConnector),
//!     router,
//!     Arc::new(AtomicMetrics::new()),
//!     event_tx,
//! );
//!
//! session.connect("wss://alerts.example.com/ws", Some("token"));
//! session.send("case.watch", serde_json::json!({ "case_id": 42 }));
//! session.close();
//! ```

pub mod config;
pub mod connection_state;
pub mod heartbeat;
pub mod message;
pub mod router;
pub mod session;
pub mod target;
pub mod ws_transport;

// Re-export main types
pub use config::{ConnectionConfig, HeartbeatConfig};
pub use connection_state::{AtomicMetrics, AtomicSessionState, Metrics, SessionState};
pub use heartbeat::{HeartbeatMonitor, HeartbeatSignal, HeartbeatState};
pub use message::{Message, PingPayload, PongPayload, PING_TYPE, PONG_TYPE};
pub use router::{MessageRouter, Routed};
pub use session::{ConnectionEvent, ConnectionSession};
pub use target::build_address;
pub use ws_transport::TungsteniteConnector;

// Re-export traits for convenience
pub use crate::traits::*;
