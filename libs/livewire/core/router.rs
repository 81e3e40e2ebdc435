//! Inbound frame classification
//!
//! ```text
//! Transport ──> Router ──┬─> pong ──────────> HeartbeatMonitor::receive_pong
//!                        ├─> malformed ─────> discarded
//!                        └─> application ───> last_message + Subscriber 1..n
//! ```
//!
//! Subscribers run synchronously, in registration order, on the session
//! task. Dispatch iterates over a snapshot of the subscriber list, so a
//! subscriber may subscribe or unsubscribe from inside its own callback.

use crate::core::heartbeat::{HeartbeatMonitor, HeartbeatSignal};
use crate::core::message::{Message, PING_TYPE};
use crate::traits::{Subscriber, SubscriptionId, WsMessage};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Outcome of routing one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Heartbeat reply, consumed by the monitor
    Pong(Option<HeartbeatSignal>),
    /// Application message delivered to this many subscribers
    Delivered(usize),
    /// Reserved type that must not reach subscribers
    Ignored,
    /// Not a JSON envelope
    Malformed,
}

/// Single dispatch point for inbound frames
pub struct MessageRouter {
    subscribers: RwLock<Vec<(SubscriptionId, Arc<dyn Subscriber>)>>,
    next_id: AtomicU64,
    last_message: RwLock<Option<Message>>,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            last_message: RwLock::new(None),
        }
    }

    /// Register a subscriber; it receives every application message from now on
    pub fn subscribe(&self, subscriber: impl Subscriber) -> SubscriptionId {
        self.subscribe_arc(Arc::new(subscriber))
    }

    pub fn subscribe_arc(&self, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, subscriber));
        debug!("Subscriber {:?} registered", id);
        id
    }

    /// Remove a subscriber. Returns false if it was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        before != subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Most recent application message
    pub fn last_message(&self) -> Option<Message> {
        self.last_message.read().clone()
    }

    /// Classify `frame` and act on it
    ///
    /// Pongs go to `heartbeat` and stop there. Malformed frames are dropped
    /// without touching the heartbeat. Everything else becomes the last
    /// message and is handed to every subscriber.
    pub fn route(&self, frame: &WsMessage, heartbeat: &mut HeartbeatMonitor) -> Routed {
        let message = match Message::from_frame(frame) {
            Ok(message) => message,
            Err(e) => {
                debug!("Discarding malformed frame: {}", e);
                return Routed::Malformed;
            }
        };

        if message.is_pong() {
            return Routed::Pong(heartbeat.receive_pong(message.pong_timestamp()));
        }

        if message.kind == PING_TYPE {
            debug!("Discarding inbound ping frame");
            return Routed::Ignored;
        }

        Routed::Delivered(self.dispatch(message))
    }

    fn dispatch(&self, message: Message) -> usize {
        trace!("Dispatching '{}'", message.kind);

        let snapshot: Vec<Arc<dyn Subscriber>> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();

        *self.last_message.write() = Some(message.clone());

        for subscriber in &snapshot {
            subscriber.on_message(&message);
        }

        snapshot.len()
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}
