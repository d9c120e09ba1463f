//! Mock event source.
//!
//! Produces one log event per interval with a random severity and hands it
//! to [`ConnectionHub::broadcast`]. Stands in for a real log feed.

use std::time::Duration;

use rand::seq::IndexedRandom;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::domain::{Envelope, LogEvent, LogLevel};
use crate::hub::ConnectionHub;

/// Builds the `sequence`-th mock log event.
#[must_use]
pub fn mock_log_event(sequence: u64) -> LogEvent {
    let level = LogLevel::ALL
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(LogLevel::Info);
    LogEvent::new(
        level,
        format!("This is a mock log message - Test message {sequence}"),
    )
}

/// Spawns the event source. It runs until the hub stops.
pub fn spawn_event_source(hub: ConnectionHub, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(run_event_source(hub, interval))
}

async fn run_event_source(hub: ConnectionHub, interval: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sequence: u64 = 0;

    loop {
        ticker.tick().await;
        sequence = sequence.saturating_add(1);
        let event = mock_log_event(sequence);
        tracing::debug!(sequence, level = %event.level, "emitting log event");

        if hub.broadcast(Envelope::Log(event)).await.is_err() {
            tracing::info!("hub stopped, event source exiting");
            break;
        }
    }
}
