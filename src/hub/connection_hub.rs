//! Connection hub: membership, broadcast fan-out, and health checks.
//!
//! The hub is split in two halves:
//!
//! - [`ConnectionHub`] is a cheap, cloneable handle. Any task may call
//!   `register`, `unregister`, `broadcast`, or `stats`; each call is a
//!   message on one of the hub's bounded input queues.
//! - [`HubLoop`] is the coordination loop. It is the only owner of the
//!   membership map and processes exactly one input (or one health-check
//!   tick) per iteration, so the map needs no lock.
//!
//! Delivery to each member is dispatched as its own task per broadcast, so
//! a slow client can stall neither the loop nor any other client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use super::connection::Connection;
use crate::config::HubConfig;
use crate::domain::{ConnectionId, Envelope};
use crate::error::HubError;

/// Snapshot of hub membership, answered from inside the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    /// Number of registered connections.
    pub connections: usize,
    /// How many of them are paused.
    pub paused: usize,
}

#[derive(Debug)]
enum Control {
    Stats(oneshot::Sender<HubStats>),
    Members(oneshot::Sender<Vec<ConnectionId>>),
    Shutdown,
}

/// Handle to the hub's coordination loop.
#[derive(Debug, Clone)]
pub struct ConnectionHub {
    register_tx: mpsc::Sender<Arc<Connection>>,
    unregister_tx: mpsc::Sender<Arc<Connection>>,
    broadcast_tx: mpsc::Sender<Envelope>,
    control_tx: mpsc::Sender<Control>,
    config: HubConfig,
}

impl ConnectionHub {
    /// Creates a hub handle and the loop it feeds.
    ///
    /// The loop must be driven with [`HubLoop::run`], typically on its own
    /// task. The loop exits on [`ConnectionHub::shutdown`] or once every
    /// handle has been dropped.
    #[must_use]
    pub fn new(config: HubConfig) -> (Self, HubLoop) {
        let capacity = config.channel_capacity.max(1);
        let (register_tx, register_rx) = mpsc::channel(capacity);
        let (unregister_tx, unregister_rx) = mpsc::channel(capacity);
        let (broadcast_tx, broadcast_rx) = mpsc::channel(capacity);
        let (control_tx, control_rx) = mpsc::channel(capacity);

        let hub_loop = HubLoop {
            connections: HashMap::new(),
            register_rx,
            unregister_rx,
            unregister_tx: unregister_tx.clone(),
            broadcast_rx,
            control_rx,
            health_check_interval: config.health_check_interval,
            ping_timeout: config.ping_timeout,
        };
        let hub = Self {
            register_tx,
            unregister_tx,
            broadcast_tx,
            control_tx,
            config,
        };
        (hub, hub_loop)
    }

    /// Returns the tunables this hub was built with.
    #[must_use]
    pub const fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Requests admission of a connection, waiting at most the configured
    /// registration timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::RegistrationTimeout`] if the hub did not accept
    /// the connection in time, or [`HubError::Stopped`] if the loop has
    /// exited. In both cases the connection has been closed.
    pub async fn register(&self, connection: Arc<Connection>) -> Result<(), HubError> {
        let id = connection.id();
        let timeout = self.config.registration_timeout;
        match tokio::time::timeout(timeout, self.register_tx.send(Arc::clone(&connection))).await
        {
            Ok(Ok(())) => {
                tracing::debug!(connection_id = %id, "connection queued for registration");
                Ok(())
            }
            Ok(Err(_)) => {
                tracing::warn!(connection_id = %id, "hub stopped, rejecting connection");
                connection.close();
                Err(HubError::Stopped)
            }
            Err(_) => {
                tracing::error!(
                    connection_id = %id,
                    ?timeout,
                    "hub registration timed out, dropping connection"
                );
                connection.close();
                Err(HubError::RegistrationTimeout(timeout))
            }
        }
    }

    /// Requests removal of a connection. Removal always closes it; removing
    /// a non-member only closes it.
    pub async fn unregister(&self, connection: Arc<Connection>) {
        if let Err(mpsc::error::SendError(connection)) = self.unregister_tx.send(connection).await
        {
            connection.close();
        }
    }

    /// Submits an envelope for delivery to every active connection.
    ///
    /// Waits while the broadcast queue is saturated.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] if the loop has exited.
    pub async fn broadcast(&self, envelope: Envelope) -> Result<(), HubError> {
        self.broadcast_tx
            .send(envelope)
            .await
            .map_err(|_| HubError::Stopped)
    }

    /// Returns the current membership counts.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] if the loop has exited.
    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (tx, rx) = oneshot::channel();
        self.control_tx
            .send(Control::Stats(tx))
            .await
            .map_err(|_| HubError::Stopped)?;
        rx.await.map_err(|_| HubError::Stopped)
    }

    /// Returns the identifiers of every registered connection.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] if the loop has exited.
    pub async fn members(&self) -> Result<Vec<ConnectionId>, HubError> {
        let (tx, rx) = oneshot::channel();
        self.control_tx
            .send(Control::Members(tx))
            .await
            .map_err(|_| HubError::Stopped)?;
        rx.await.map_err(|_| HubError::Stopped)
    }

    /// Stops the loop. Every registered connection is closed on exit.
    pub async fn shutdown(&self) {
        if self.control_tx.send(Control::Shutdown).await.is_err() {
            tracing::debug!("hub already stopped");
        }
    }
}

/// The hub's coordination loop. Sole owner of the membership map.
#[derive(Debug)]
pub struct HubLoop {
    connections: HashMap<ConnectionId, Arc<Connection>>,
    register_rx: mpsc::Receiver<Arc<Connection>>,
    unregister_rx: mpsc::Receiver<Arc<Connection>>,
    /// Lets the loop route suspected-unhealthy connections through the
    /// same removal queue external callers use.
    unregister_tx: mpsc::Sender<Arc<Connection>>,
    broadcast_rx: mpsc::Receiver<Envelope>,
    control_rx: mpsc::Receiver<Control>,
    health_check_interval: Duration,
    ping_timeout: Duration,
}

impl HubLoop {
    /// Runs until shutdown, then closes every remaining connection.
    pub async fn run(mut self) {
        tracing::info!("hub loop started");
        let period = self.health_check_interval;
        let mut health = tokio::time::interval_at(Instant::now() + period, period);
        health.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Health ticks first so a registration flood cannot starve them;
            // then membership changes, so queries and broadcasts observe
            // every request queued before them.
            tokio::select! {
                biased;

                _ = health.tick() => self.check_connection_health().await,
                Some(connection) = self.register_rx.recv() => self.add(connection),
                Some(connection) = self.unregister_rx.recv() => self.remove(&connection),
                envelope = self.broadcast_rx.recv() => match envelope {
                    Some(envelope) => self.fan_out(envelope),
                    None => break,
                },
                control = self.control_rx.recv() => match control {
                    Some(Control::Stats(reply)) => {
                        let _ = reply.send(self.stats());
                    }
                    Some(Control::Members(reply)) => {
                        let _ = reply.send(self.connections.keys().copied().collect());
                    }
                    Some(Control::Shutdown) | None => break,
                },
            }
        }

        self.register_rx.close();
        self.unregister_rx.close();
        self.broadcast_rx.close();
        self.control_rx.close();
        while let Ok(connection) = self.register_rx.try_recv() {
            connection.close();
        }
        while let Ok(connection) = self.unregister_rx.try_recv() {
            connection.close();
        }
        self.close_all();
        tracing::info!("hub loop stopped");
    }

    fn add(&mut self, connection: Arc<Connection>) {
        let id = connection.id();
        self.connections.insert(id, connection);
        tracing::info!(connection_id = %id, total = self.connections.len(), "registered connection");
    }

    fn remove(&mut self, connection: &Connection) {
        let id = connection.id();
        if self.connections.remove(&id).is_some() {
            tracing::info!(connection_id = %id, total = self.connections.len(), "unregistered connection");
        }
        connection.close();
    }

    fn stats(&self) -> HubStats {
        HubStats {
            connections: self.connections.len(),
            paused: self.connections.values().filter(|c| c.is_paused()).count(),
        }
    }

    /// Routes a connection to the unregister queue without blocking. When
    /// the queue is saturated the connection is closed and dropped here.
    fn unregister_or_force_close(&mut self, connection: Arc<Connection>) {
        match self.unregister_tx.try_send(connection) {
            Ok(()) => {}
            Err(
                mpsc::error::TrySendError::Full(connection)
                | mpsc::error::TrySendError::Closed(connection),
            ) => {
                tracing::warn!(
                    connection_id = %connection.id(),
                    "unregister queue full, closing connection immediately"
                );
                self.remove(&connection);
            }
        }
    }

    /// One health-check sweep.
    ///
    /// Closed connections are removed directly; connections past the drop
    /// predicate, or paused ones that fail a liveness ping, are queued for
    /// unregistration.
    async fn check_connection_health(&mut self) {
        let snapshot: Vec<Arc<Connection>> = self.connections.values().map(Arc::clone).collect();
        let mut to_drop = Vec::new();
        let mut to_ping = Vec::new();

        for connection in snapshot {
            if connection.is_closed() {
                tracing::debug!(connection_id = %connection.id(), "health check: closed, removing");
                self.remove(&connection);
            } else if connection.should_drop() {
                tracing::info!(connection_id = %connection.id(), "health check: paused and silent, dropping");
                to_drop.push(connection);
            } else if connection.is_paused() {
                to_ping.push(connection);
            }
        }

        let timeout = self.ping_timeout;
        let pings = to_ping.iter().map(|connection| async move {
            match tokio::time::timeout(timeout, connection.send_ping()).await {
                Ok(Ok(())) => true,
                Ok(Err(_)) => false,
                Err(_) => {
                    tracing::warn!(connection_id = %connection.id(), "health check: ping timed out");
                    false
                }
            }
        });
        let results = futures_util::future::join_all(pings).await;
        to_drop.extend(
            to_ping
                .into_iter()
                .zip(results)
                .filter_map(|(connection, alive)| (!alive).then_some(connection)),
        );

        for connection in to_drop {
            self.unregister_or_force_close(connection);
        }
    }

    fn fan_out(&mut self, envelope: Envelope) {
        if self.connections.is_empty() {
            tracing::trace!(msg_type = envelope.msg_type(), "no connections, dropping broadcast");
            return;
        }

        let (stale, alive): (Vec<Arc<Connection>>, Vec<Arc<Connection>>) = self
            .connections
            .values()
            .map(Arc::clone)
            .partition(|connection| connection.is_closed());

        tracing::debug!(
            msg_type = envelope.msg_type(),
            recipients = alive.len(),
            stale = stale.len(),
            "broadcasting"
        );

        for connection in stale {
            self.unregister_or_force_close(connection);
        }

        for connection in alive {
            let envelope = envelope.clone();
            tokio::spawn(async move {
                if !connection.is_paused() && !connection.should_drop() {
                    connection.enqueue_for_delivery(envelope);
                }
            });
        }
    }

    fn close_all(&mut self) {
        let count = self.connections.len();
        for (_, connection) in self.connections.drain() {
            connection.close();
        }
        tracing::info!(closed = count, "closed all connections on shutdown");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::domain::{LogEvent, LogLevel};
    use crate::hub::test_wire::{self, WireHarness};

    fn spawn_hub(config: HubConfig) -> ConnectionHub {
        let (hub, hub_loop) = ConnectionHub::new(config);
        tokio::spawn(hub_loop.run());
        hub
    }

    fn connection(hub: &ConnectionHub) -> (Arc<Connection>, WireHarness) {
        let (sink, stream, harness) = test_wire::wire();
        (Connection::new(sink, stream, hub.config()), harness)
    }

    fn log(message: &str) -> Envelope {
        Envelope::Log(LogEvent::new(LogLevel::Info, message))
    }

    async fn member_set(hub: &ConnectionHub) -> HashSet<ConnectionId> {
        let Ok(members) = hub.members().await else {
            panic!("hub stopped");
        };
        members.into_iter().collect()
    }

    #[tokio::test]
    async fn membership_tracks_register_and_unregister() {
        let hub = spawn_hub(HubConfig::default());
        let (a, _wa) = connection(&hub);
        let (b, _wb) = connection(&hub);
        let (c, _wc) = connection(&hub);

        for conn in [&a, &b, &c] {
            assert!(hub.register(Arc::clone(conn)).await.is_ok());
        }
        // Registering twice must not duplicate.
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        hub.unregister(Arc::clone(&b)).await;

        let expected: HashSet<_> = [a.id(), c.id()].into_iter().collect();
        assert_eq!(member_set(&hub).await, expected);
        assert!(b.is_closed());

        // Removing a non-member is a no-op for the set.
        hub.unregister(Arc::clone(&b)).await;
        assert_eq!(member_set(&hub).await, expected);
    }

    #[tokio::test]
    async fn broadcast_with_no_connections_is_noop() {
        let hub = spawn_hub(HubConfig::default());
        assert!(hub.broadcast(log("nobody")).await.is_ok());
        let Ok(stats) = hub.stats().await else {
            panic!("hub stopped");
        };
        assert_eq!(stats, HubStats::default());
    }

    #[tokio::test]
    async fn broadcast_reaches_registered_connection_unmodified() {
        let hub = spawn_hub(HubConfig::default());
        let (a, mut wire) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        a.start();

        let envelope = log("m");
        assert!(hub.broadcast(envelope.clone()).await.is_ok());
        assert_eq!(wire.written.recv().await, Some(envelope));
    }

    #[tokio::test]
    async fn broadcast_fills_outbound_buffer() {
        let hub = spawn_hub(HubConfig::default());
        let (a, _wire) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());

        assert!(hub.broadcast(log("m")).await.is_ok());
        test_wire::wait_until(|| a.buffered_len() == 1).await;
    }

    #[tokio::test]
    async fn paused_connection_skips_logs_until_resumed() {
        let hub = spawn_hub(HubConfig::default());
        let (a, mut wire) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        a.start();

        test_wire::push(&wire, Envelope::Pause);
        test_wire::wait_until(|| a.is_paused()).await;
        assert!(hub.broadcast(log("while paused")).await.is_ok());

        // Round-trip through the loop so the fan-out task has been spawned.
        assert!(hub.stats().await.is_ok());
        tokio::task::yield_now().await;

        test_wire::push(&wire, Envelope::Resume);
        test_wire::wait_until(|| !a.is_paused()).await;
        let after = log("after resume");
        assert!(hub.broadcast(after.clone()).await.is_ok());

        assert_eq!(wire.written.recv().await, Some(after));
    }

    #[tokio::test]
    async fn paused_connection_still_answers_ping() {
        let hub = spawn_hub(HubConfig::default());
        let (a, mut wire) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        a.start();

        test_wire::push(&wire, Envelope::Pause);
        test_wire::push(&wire, Envelope::heartbeat_ping());
        assert_eq!(wire.written.recv().await, Some(Envelope::heartbeat_pong()));
        assert!(a.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn health_check_pings_paused_connections() {
        let hub = spawn_hub(HubConfig::default());
        let (a, mut wire) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        a.set_paused(true);

        tokio::time::advance(Duration::from_millis(2100)).await;
        assert_eq!(wire.written.recv().await, Some(Envelope::heartbeat_ping()));
        assert!(!a.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn silent_paused_connection_is_reaped() {
        let hub = spawn_hub(HubConfig::default());
        let (a, _wire) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        a.set_paused(true);

        // Pings succeed but the client never answers.
        tokio::time::sleep(Duration::from_secs(13)).await;

        assert!(a.is_closed());
        assert!(member_set(&hub).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn paused_connection_answering_pings_survives() {
        let hub = spawn_hub(HubConfig::default());
        let (a, mut wire) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        a.start();
        test_wire::push(&wire, Envelope::Pause);
        test_wire::wait_until(|| a.is_paused()).await;

        for _ in 0..8 {
            let Some(Envelope::Ping(_)) = wire.written.recv().await else {
                panic!("expected a liveness ping");
            };
            test_wire::push(&wire, Envelope::heartbeat_pong());
        }

        assert!(!a.is_closed());
        assert_eq!(member_set(&hub).await.len(), 1);
    }

    #[tokio::test]
    async fn failed_write_is_removed_by_health_check() {
        let config = HubConfig {
            health_check_interval: Duration::from_millis(20),
            ..HubConfig::default()
        };
        let hub = spawn_hub(config);
        let (a, wire) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        a.start();
        wire.fail_writes.store(true, Ordering::SeqCst);

        assert!(hub.broadcast(log("doomed")).await.is_ok());
        test_wire::wait_until(|| a.is_closed()).await;

        let mut gone = false;
        for _ in 0..100 {
            if member_set(&hub).await.is_empty() {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(gone, "closed connection still registered");
    }

    #[tokio::test]
    async fn broadcast_prunes_closed_connections() {
        let hub = spawn_hub(HubConfig::default());
        let (a, _wa) = connection(&hub);
        let (b, mut wb) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        assert!(hub.register(Arc::clone(&b)).await.is_ok());
        b.start();
        a.close();

        let envelope = log("m");
        assert!(hub.broadcast(envelope.clone()).await.is_ok());
        assert_eq!(wb.written.recv().await, Some(envelope));

        let expected: HashSet<_> = [b.id()].into_iter().collect();
        assert_eq!(member_set(&hub).await, expected);
    }

    #[tokio::test]
    async fn one_full_buffer_does_not_block_others() {
        let config = HubConfig {
            outbound_buffer_capacity: 1,
            ..HubConfig::default()
        };
        let hub = spawn_hub(config);
        let (slow, _ws) = connection(&hub);
        let (fast, mut wf) = connection(&hub);
        assert!(hub.register(Arc::clone(&slow)).await.is_ok());
        assert!(hub.register(Arc::clone(&fast)).await.is_ok());
        fast.start();

        for i in 0..5 {
            let envelope = log(&format!("m{i}"));
            assert!(hub.broadcast(envelope.clone()).await.is_ok());
            assert_eq!(wf.written.recv().await, Some(envelope));
        }
        assert_eq!(slow.buffered_len(), 1);
        assert!(!slow.is_closed());
    }

    #[tokio::test]
    async fn registration_times_out_and_closes() {
        let config = HubConfig {
            channel_capacity: 1,
            registration_timeout: Duration::from_millis(50),
            ..HubConfig::default()
        };
        // The loop is never run, so the queue fills after one request.
        let (hub, _hub_loop) = ConnectionHub::new(config);
        let (first, _w1) = connection(&hub);
        let (second, _w2) = connection(&hub);

        assert!(hub.register(first).await.is_ok());
        let result = hub.register(Arc::clone(&second)).await;
        assert!(matches!(result, Err(HubError::RegistrationTimeout(_))));
        assert!(second.is_closed());
    }

    #[tokio::test]
    async fn shutdown_closes_members_and_stops_hub() {
        let hub = spawn_hub(HubConfig::default());
        let (a, _wa) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        assert!(hub.stats().await.is_ok());

        hub.shutdown().await;
        test_wire::wait_until(|| a.is_closed()).await;
        assert!(matches!(hub.broadcast(log("late")).await, Err(HubError::Stopped)));

        let (b, _wb) = connection(&hub);
        assert!(matches!(hub.register(Arc::clone(&b)).await, Err(HubError::Stopped)));
        assert!(b.is_closed());
    }

    #[tokio::test]
    async fn stats_counts_paused() {
        let hub = spawn_hub(HubConfig::default());
        let (a, _wa) = connection(&hub);
        let (b, _wb) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        assert!(hub.register(Arc::clone(&b)).await.is_ok());
        b.set_paused(true);

        let Ok(stats) = hub.stats().await else {
            panic!("hub stopped");
        };
        assert_eq!(stats, HubStats { connections: 2, paused: 1 });
    }

    /// Builds a loop whose unregister queue holds one entry and is full.
    fn loop_with_full_unregister_queue(
        config: HubConfig,
    ) -> (ConnectionHub, HubLoop, WireHarness) {
        let config = HubConfig {
            channel_capacity: 1,
            ..config
        };
        let (hub, hub_loop) = ConnectionHub::new(config);
        let (filler, harness) = connection(&hub);
        assert!(hub_loop.unregister_tx.try_send(filler).is_ok());
        (hub, hub_loop, harness)
    }

    #[tokio::test]
    async fn saturated_unregister_queue_forces_close_on_broadcast() {
        let (hub, mut hub_loop, _filler) = loop_with_full_unregister_queue(HubConfig::default());
        let members: Vec<_> = (0..3).map(|_| connection(&hub)).collect();
        for (conn, _) in &members {
            hub_loop.add(Arc::clone(conn));
            conn.close();
        }

        hub_loop.fan_out(log("m"));

        assert!(hub_loop.connections.is_empty());
        assert!(members.iter().all(|(conn, _)| conn.is_closed()));
    }

    #[tokio::test(start_paused = true)]
    async fn saturated_unregister_queue_forces_close_on_health_check() {
        let (hub, mut hub_loop, _filler) = loop_with_full_unregister_queue(HubConfig::default());
        let (silent, _wire) = connection(&hub);
        hub_loop.add(Arc::clone(&silent));
        silent.set_paused(true);
        tokio::time::advance(Duration::from_secs(11)).await;

        hub_loop.check_connection_health().await;

        assert!(silent.is_closed());
        assert!(hub_loop.connections.is_empty());
    }

    #[tokio::test]
    async fn paused_connection_with_failing_ping_is_removed() {
        let config = HubConfig {
            health_check_interval: Duration::from_millis(20),
            ..HubConfig::default()
        };
        let hub = spawn_hub(config);
        let (a, wire) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        a.set_paused(true);
        wire.fail_writes.store(true, Ordering::SeqCst);

        test_wire::wait_until(|| a.is_closed()).await;
        let mut gone = false;
        for _ in 0..100 {
            if member_set(&hub).await.is_empty() {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(gone, "connection with failing ping still registered");
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_ping_times_out_and_is_removed() {
        let hub = spawn_hub(HubConfig::default());
        let (a, wire) = connection(&hub);
        assert!(hub.register(Arc::clone(&a)).await.is_ok());
        a.set_paused(true);
        wire.stall_writes.store(true, Ordering::SeqCst);

        // First tick at 2 s, ping gives up at 3 s, removal follows.
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert!(a.is_closed());
        assert!(member_set(&hub).await.is_empty());
    }

    #[tokio::test]
    async fn shutdown_closes_queued_unregistrations() {
        let config = HubConfig {
            channel_capacity: 4,
            ..HubConfig::default()
        };
        let (hub, hub_loop) = ConnectionHub::new(config);
        let (stranger, _wire) = connection(&hub);
        hub.unregister(Arc::clone(&stranger)).await;
        hub.shutdown().await;
        assert!(!stranger.is_closed());

        hub_loop.run().await;
        assert!(stranger.is_closed());
    }
}
