use crate::core::message::Message;

/// Consumer of application messages
///
/// Subscribers are invoked synchronously on the session task, once per
/// non-control message, in arrival order. Keep `on_message` short: a slow
/// subscriber delays every subscriber registered after it and the heartbeat.
///
/// Any `Fn(&Message)` closure is a subscriber:
///
/// ```ignore
/// let id = manager.subscribe(|message: &Message| {
///     if message.kind == "alert.created" {
///         info!("new alert: {}", message.payload);
///     }
/// });
/// ```
pub trait Subscriber: Send + Sync + 'static {
    /// Handle one application message
    fn on_message(&self, message: &Message);
}

impl<F> Subscriber for F
where
    F: Fn(&Message) + Send + Sync + 'static,
{
    fn on_message(&self, message: &Message) {
        self(message)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);
