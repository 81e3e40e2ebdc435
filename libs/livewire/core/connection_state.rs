//! Lock-free session state and counters
//!
//! Both are written by the session task and read from any thread through
//! the facade.

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::time::Duration;

/// Lifecycle state of a session
///
/// ```text
/// Idle ─> Connecting ─> Open ─> Closing ─> Closed
///              │                              │
///              └──────────> Closed <──────────┘ (retry / external connect)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Connecting = 1,
    Open = 2,
    Closing = 3,
    Closed = 4,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Idle,
            1 => SessionState::Connecting,
            2 => SessionState::Open,
            3 => SessionState::Closing,
            _ => SessionState::Closed,
        }
    }

    /// Connecting or Open
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Open)
    }
}

/// Atomic wrapper around [`SessionState`]
#[derive(Debug)]
pub struct AtomicSessionState {
    inner: AtomicU8,
}

impl AtomicSessionState {
    pub fn new(state: SessionState) -> Self {
        Self {
            inner: AtomicU8::new(state as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.inner.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: SessionState) {
        self.inner.store(state as u8, Ordering::Release);
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.get() == SessionState::Open
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.get().is_active()
    }
}

impl Default for AtomicSessionState {
    fn default() -> Self {
        Self::new(SessionState::Idle)
    }
}

/// Counters shared by every session of one manager
#[derive(Debug)]
pub struct AtomicMetrics {
    frames_sent: AtomicU64,
    frames_received: AtomicU64,
    sends_dropped: AtomicU64,
    malformed_frames: AtomicU64,
    reconnects: AtomicU64,
    /// Last heartbeat round trip in ms, -1 until the first pong
    last_latency_ms: AtomicI64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self {
            frames_sent: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            sends_dropped: AtomicU64::new(0),
            malformed_frames: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            last_latency_ms: AtomicI64::new(-1),
        }
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_dropped(&self) {
        self.sends_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_malformed(&self) {
        self.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_reconnects(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_latency(&self, latency: Duration) {
        self.last_latency_ms
            .store(latency.as_millis() as i64, Ordering::Relaxed);
    }

    pub fn snapshot(&self, state: SessionState) -> Metrics {
        let latency = self.last_latency_ms.load(Ordering::Relaxed);
        Metrics {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            sends_dropped: self.sends_dropped.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            last_latency: (latency >= 0).then(|| Duration::from_millis(latency as u64)),
            session_state: state,
        }
    }
}

impl Default for AtomicMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub sends_dropped: u64,
    pub malformed_frames: u64,
    pub reconnects: u64,
    pub last_latency: Option<Duration>,
    pub session_state: SessionState,
}
