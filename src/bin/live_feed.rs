//! Live feed demo binary
//!
//! Connects to the dashboard channel described by `config/live_feed.yaml`
//! (or `LIVE_FEED_CONFIG_PATH`), logs every application message and
//! connection event, and closes cleanly on Ctrl+C.

use anyhow::{Context, Result};
use fraudwatch_live::bin_common::{
    init_tracing, load_config_from_env, BinaryRunner, ConfigType, LiveFeedConfig, RunConfig,
    ShutdownManager,
};
use fraudwatch_live::livewire::{ConnectionEvent, ConnectionManager, Message, StaticToken};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

struct LiveFeedApp {
    run_config: RunConfig,
    manager: ConnectionManager,
    shutdown: ShutdownManager,
    messages: Arc<AtomicU64>,
}

impl LiveFeedApp {
    fn new(config: LiveFeedConfig) -> Result<Self> {
        let run_config = RunConfig::new("live_feed")
            .with_status_interval(Duration::from_secs(config.status_interval_secs));

        let messages = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&messages);

        let mut builder = ConnectionManager::builder(config.connection.clone()).on_message(
            move |message: &Message| {
                counter.fetch_add(1, Ordering::Relaxed);
                info!("[{}] {}", message.kind, message.payload);
            },
        );
        if let Some(token) = config.token {
            builder = builder.credentials(Arc::new(StaticToken::new(token)));
        }
        let manager = builder.build().context("invalid connection config")?;

        let shutdown = ShutdownManager::new();
        shutdown.spawn_signal_handler();

        Ok(Self {
            run_config,
            manager,
            shutdown,
            messages,
        })
    }

    fn log_event(event: &ConnectionEvent) {
        match event {
            ConnectionEvent::Connected => info!("Channel open"),
            ConnectionEvent::Disconnected => warn!("Channel closed"),
            ConnectionEvent::Reconnecting(attempt) => info!("Reconnect attempt {} scheduled", attempt),
            ConnectionEvent::ReconnectExhausted => {
                warn!("Reconnect budget spent, channel stays closed")
            }
            ConnectionEvent::HeartbeatMissed(missed) => warn!("Missed pong ({})", missed),
            ConnectionEvent::HeartbeatTimeout => warn!("Heartbeat timed out"),
            ConnectionEvent::HeartbeatRestored => info!("Heartbeat restored"),
            ConnectionEvent::Connecting(attempt) => debug!("Connecting (attempt {})", attempt),
        }
    }
}

impl BinaryRunner for LiveFeedApp {
    async fn run(&mut self) -> Result<()> {
        self.manager.start().await;

        let mut next_status = Instant::now() + self.run_config.status_interval;
        while self.shutdown.is_running() {
            while let Some(event) = self.manager.try_recv_event() {
                Self::log_event(&event);
            }

            if Instant::now() >= next_status {
                let metrics = self.manager.metrics();
                info!(
                    "Status: {:?}, {} messages, {} reconnects, latency {:?}",
                    metrics.session_state,
                    self.messages.load(Ordering::Relaxed),
                    metrics.reconnects,
                    metrics.last_latency
                );
                next_status = Instant::now() + self.run_config.status_interval;
            }

            self.shutdown
                .interruptible_sleep(self.run_config.poll_interval)
                .await;
        }

        self.manager.close();
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }

    fn stats(&self) -> Option<String> {
        let metrics = self.manager.metrics();
        Some(format!(
            "Frames: {} received, {} sent, {} dropped, {} malformed",
            metrics.frames_received, metrics.frames_sent, metrics.sends_dropped, metrics.malformed_frames
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = load_config_from_env(ConfigType::LiveFeed);
    let config = LiveFeedConfig::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    init_tracing(&config.log_level);
    config.log();

    let mut app = LiveFeedApp::new(config)?;
    app.execute().await
}
