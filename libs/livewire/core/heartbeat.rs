//! Heartbeat monitor for an open channel
//!
//! # Architecture
//!
//! The monitor is a timer-driven state machine owned by the session task.
//! It never touches the transport: pings leave through the session's
//! outbound channel, pongs are handed in by the router.
//!
//! ```text
//! ┌──────────────────────┐
//! │  HeartbeatMonitor    │
//! │                      │  ping {timestamp, sequence}
//! │  every `interval`: ──┼──> Outbound Channel ──> Session Loop ──> Transport
//! │   send ping,         │
//! │   arm `timeout`      │
//! │                      │  pong {timestamp}
//! │  receive_pong() <────┼──── Router <── Session Loop <── Transport
//! └──────────────────────┘
//! ```
//!
//! A ping left unanswered for `timeout` is a missed pong. After
//! `missed_pong_threshold` consecutive misses the monitor reports
//! [`HeartbeatSignal::TimedOut`] once and stops pinging; closing the
//! transport is the session's call.
//!
//! Pings go out on the fixed interval whatever the application traffic:
//! inbound data does not prove the outbound path is alive.

use crate::core::config::HeartbeatConfig;
use crate::core::message::{epoch_millis, Message};
use crate::traits::WsMessage;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What the monitor reports back to its session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatSignal {
    /// A ping went unanswered; carries the consecutive miss count
    Missed(u32),
    /// Threshold reached; the connection is considered dead
    TimedOut,
    /// A pong arrived after one or more misses
    Restored,
}

/// Counters and timers of one monitor
#[derive(Debug, Clone, Default)]
pub struct HeartbeatState {
    /// Sequence of the last ping sent; 0 before the first ping
    pub ping_sequence: u64,
    /// Consecutive pings unanswered within the timeout
    pub missed_pongs: u32,
    next_ping: Option<Instant>,
    pong_deadline: Option<Instant>,
}

/// Ping/pong liveness monitor bound to one session
pub struct HeartbeatMonitor {
    interval: Duration,
    timeout: Duration,
    threshold: u32,
    outbound: UnboundedSender<WsMessage>,
    state: HeartbeatState,
    timed_out: bool,
    last_latency: Option<Duration>,
}

impl HeartbeatMonitor {
    /// Create a monitor that sends its pings through `outbound`
    pub fn new(config: &HeartbeatConfig, outbound: UnboundedSender<WsMessage>) -> Self {
        Self {
            interval: config.interval(),
            timeout: config.timeout(),
            threshold: config.missed_pong_threshold.max(1),
            outbound,
            state: HeartbeatState::default(),
            timed_out: false,
            last_latency: None,
        }
    }

    /// Arm the repeating ping timer; the first ping goes out after one interval
    pub fn start(&mut self) {
        if self.timed_out {
            debug!("Heartbeat already timed out, not restarting");
            return;
        }
        self.state.next_ping = Some(Instant::now() + self.interval);
        debug!("Heartbeat started with interval: {:?}", self.interval);
    }

    /// Clear every timer. Idempotent
    pub fn stop(&mut self) {
        if self.state.next_ping.take().is_some() || self.state.pong_deadline.take().is_some() {
            debug!("Heartbeat stopped after {} pings", self.state.ping_sequence);
        }
        self.state.pong_deadline = None;
    }

    pub fn is_running(&self) -> bool {
        self.state.next_ping.is_some()
    }

    /// Earliest armed timer, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.state.next_ping, self.state.pong_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Resolve when the next timer is due; never resolves while no timer is armed
    pub async fn expired(&self) {
        match self.next_deadline() {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    /// Run every timer due at `now`
    ///
    /// The pong timeout is handled before a ping due at the same instant, so
    /// a fresh ping never cancels the miss of the previous one.
    pub fn fire(&mut self, now: Instant) -> Option<HeartbeatSignal> {
        let mut signal = None;

        if matches!(self.state.pong_deadline, Some(deadline) if deadline <= now) {
            self.state.pong_deadline = None;
            signal = Some(self.pong_timed_out());
        }

        if let Some(at) = self.state.next_ping {
            if at <= now {
                self.send_ping(now);
            }
        }

        signal
    }

    /// Handle an inbound pong echoing `timestamp`
    ///
    /// Only a pong arriving while the monitor runs and after at least one
    /// ping counts; anything else is ignored and leaves the miss count alone.
    pub fn receive_pong(&mut self, timestamp: Option<i64>) -> Option<HeartbeatSignal> {
        if !self.is_running() || self.state.ping_sequence == 0 {
            debug!("Ignoring pong outside an active ping cycle");
            return None;
        }

        self.state.pong_deadline = None;

        if let Some(sent_at) = timestamp {
            let latency = Duration::from_millis(epoch_millis().saturating_sub(sent_at).max(0) as u64);
            self.last_latency = Some(latency);
            debug!("Pong received, latency: {:?}", latency);
        }

        if self.state.missed_pongs > 0 {
            info!(
                "Heartbeat restored after {} missed pong(s)",
                self.state.missed_pongs
            );
            self.state.missed_pongs = 0;
            return Some(HeartbeatSignal::Restored);
        }

        None
    }

    pub fn sequence(&self) -> u64 {
        self.state.ping_sequence
    }

    pub fn missed_pongs(&self) -> u32 {
        self.state.missed_pongs
    }

    pub fn is_timed_out(&self) -> bool {
        self.timed_out
    }

    /// Round trip of the last pong carrying a timestamp
    pub fn last_latency(&self) -> Option<Duration> {
        self.last_latency
    }

    pub fn state(&self) -> &HeartbeatState {
        &self.state
    }

    fn send_ping(&mut self, now: Instant) {
        self.state.ping_sequence += 1;
        let sequence = self.state.ping_sequence;

        match Message::ping(sequence, epoch_millis()).and_then(|ping| ping.to_frame()) {
            Ok(frame) => {
                if self.outbound.send(frame).is_err() {
                    debug!("Heartbeat outbound channel closed, ping {} dropped", sequence);
                }
            }
            Err(e) => warn!("Failed to encode ping {}: {}", sequence, e),
        }

        // Re-arming replaces any timeout still pending for the previous ping
        self.state.pong_deadline = Some(now + self.timeout);
        self.state.next_ping = Some(now + self.interval);
        debug!("Heartbeat ping {} sent", sequence);
    }

    fn pong_timed_out(&mut self) -> HeartbeatSignal {
        self.state.missed_pongs += 1;
        let missed = self.state.missed_pongs;

        if missed >= self.threshold {
            warn!("Heartbeat timed out after {} missed pongs", missed);
            self.timed_out = true;
            self.stop();
            HeartbeatSignal::TimedOut
        } else {
            warn!("Missed pong ({}/{})", missed, self.threshold);
            HeartbeatSignal::Missed(missed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn monitor() -> (HeartbeatMonitor, UnboundedReceiver<WsMessage>) {
        let (tx, rx) = unbounded_channel();
        let config = HeartbeatConfig {
            interval_ms: 30_000,
            timeout_ms: 5_000,
            missed_pong_threshold: 3,
        };
        (HeartbeatMonitor::new(&config, tx), rx)
    }

    fn sequences(rx: &mut UnboundedReceiver<WsMessage>) -> Vec<u64> {
        let mut out = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            let ping = Message::from_frame(&frame).unwrap().ping_payload().unwrap();
            out.push(ping.sequence);
        }
        out
    }

    /// Drive the monitor until `n` signals were produced or no timer is armed
    async fn run_until_signals(monitor: &mut HeartbeatMonitor, n: usize) -> Vec<HeartbeatSignal> {
        let mut signals = Vec::new();
        while signals.len() < n && monitor.next_deadline().is_some() {
            monitor.expired().await;
            if let Some(signal) = monitor.fire(Instant::now()) {
                signals.push(signal);
            }
        }
        signals
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_ping_after_one_interval() {
        let (mut monitor, mut rx) = monitor();
        let started = Instant::now();
        monitor.start();

        monitor.expired().await;
        assert!(started.elapsed() >= Duration::from_millis(30_000));
        assert!(started.elapsed() < Duration::from_millis(30_010));
        assert!(monitor.fire(Instant::now()).is_none());
        assert_eq!(sequences(&mut rx), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_strictly_increases() {
        let (mut monitor, mut rx) = monitor();
        monitor.start();

        for _ in 0..4 {
            monitor.expired().await;
            monitor.fire(Instant::now());
            monitor.receive_pong(Some(epoch_millis()));
        }

        assert_eq!(sequences(&mut rx), vec![1, 2, 3, 4]);
        assert_eq!(monitor.missed_pongs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_once_at_threshold() {
        let (mut monitor, mut rx) = monitor();
        monitor.start();

        let signals = run_until_signals(&mut monitor, 10).await;
        assert_eq!(
            signals,
            vec![
                HeartbeatSignal::Missed(1),
                HeartbeatSignal::Missed(2),
                HeartbeatSignal::TimedOut
            ]
        );
        assert!(monitor.is_timed_out());
        assert!(monitor.next_deadline().is_none());
        assert_eq!(sequences(&mut rx), vec![1, 2, 3]);

        // A timed out monitor stays silent
        monitor.start();
        assert!(!monitor.is_running());
        assert!(monitor.fire(Instant::now() + Duration::from_secs(600)).is_none());
        assert!(sequences(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pong_after_miss_restores_once() {
        let (mut monitor, _rx) = monitor();
        monitor.start();

        let signals = run_until_signals(&mut monitor, 1).await;
        assert_eq!(signals, vec![HeartbeatSignal::Missed(1)]);

        assert_eq!(monitor.receive_pong(Some(epoch_millis())), Some(HeartbeatSignal::Restored));
        assert_eq!(monitor.missed_pongs(), 0);
        assert_eq!(monitor.receive_pong(Some(epoch_millis())), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pong_clears_timeout() {
        let (mut monitor, _rx) = monitor();
        monitor.start();

        monitor.expired().await;
        monitor.fire(Instant::now());
        monitor.receive_pong(None);

        // Next timer is the following ping, not the cleared timeout
        let next = monitor.next_deadline().unwrap();
        assert_eq!(next - Instant::now(), Duration::from_millis(30_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_misses_are_consecutive_only() {
        let (mut monitor, _rx) = monitor();
        monitor.start();

        run_until_signals(&mut monitor, 2).await;
        assert_eq!(monitor.missed_pongs(), 2);

        // Answer the third ping: the counter starts over
        monitor.expired().await;
        monitor.fire(Instant::now());
        assert_eq!(monitor.receive_pong(None), Some(HeartbeatSignal::Restored));

        let signals = run_until_signals(&mut monitor, 1).await;
        assert_eq!(signals, vec![HeartbeatSignal::Missed(1)]);
        assert!(!monitor.is_timed_out());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pong_before_any_ping_is_ignored() {
        let (mut monitor, _rx) = monitor();
        assert!(monitor.receive_pong(Some(epoch_millis())).is_none());

        monitor.start();
        assert!(monitor.receive_pong(Some(epoch_millis())).is_none());
        assert_eq!(monitor.missed_pongs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_silences_timers() {
        let (mut monitor, mut rx) = monitor();
        monitor.start();
        monitor.expired().await;
        monitor.fire(Instant::now());

        monitor.stop();
        monitor.stop();

        assert!(monitor.next_deadline().is_none());
        assert!(monitor.fire(Instant::now() + Duration::from_secs(3600)).is_none());
        assert_eq!(sequences(&mut rx), vec![1]);
    }
}
