//! A single client connection: outbound buffer, flow control, liveness.
//!
//! A [`Connection`] wraps one client's bidirectional envelope stream. It
//! owns a bounded outbound buffer drained by its outbound task, and a small
//! piece of mutable state (closed, paused, last activity) guarded by a
//! per-connection read/write lock. Two tasks run per connection:
//!
//! - the **inbound task** reads client envelopes and applies pause, resume,
//!   ping, and pong to the connection's own state;
//! - the **outbound task** drains the buffer in order and writes each
//!   envelope to the wire.
//!
//! Either task ending closes the connection. Closing is idempotent and
//! terminal, and unwinds both tasks.

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::config::HubConfig;
use crate::domain::{ConnectionId, Envelope};
use crate::error::TransportError;

/// Write half of a client wire.
pub type WireSink = Pin<Box<dyn Sink<Envelope, Error = TransportError> + Send>>;

/// Read half of a client wire. An `Err` item or the end of the stream is
/// terminal for the connection.
pub type WireStream = Pin<Box<dyn Stream<Item = Result<Envelope, TransportError>> + Send>>;

/// Result of [`Connection::enqueue_for_delivery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The envelope is in the outbound buffer.
    Queued,
    /// The buffer was full; the envelope was dropped for this connection.
    Dropped,
    /// The connection is closed; nothing was done.
    Closed,
}

#[derive(Debug)]
struct ConnectionState {
    closed: bool,
    paused: bool,
    last_activity: Instant,
    /// `None` once closed. Dropping the sender releases the outbound task.
    outbound: Option<mpsc::Sender<Envelope>>,
}

impl ConnectionState {
    fn touch(&mut self) {
        let now = Instant::now();
        if now > self.last_activity {
            self.last_activity = now;
        }
    }
}

/// One client's connection, shared between its tasks and the hub.
pub struct Connection {
    id: ConnectionId,
    state: RwLock<ConnectionState>,
    closed_signal: watch::Sender<bool>,
    writer: tokio::sync::Mutex<WireSink>,
    reader: Mutex<Option<WireStream>>,
    outbound_rx: Mutex<Option<mpsc::Receiver<Envelope>>>,
    paused_dead_threshold: Duration,
}

impl Connection {
    /// Creates a connection over the given wire halves.
    ///
    /// The connection is open and active but its tasks are not running;
    /// call [`Connection::start`] once it has been registered.
    #[must_use]
    pub fn new(sink: WireSink, stream: WireStream, config: &HubConfig) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(config.outbound_buffer_capacity.max(1));
        let (closed_signal, _) = watch::channel(false);
        let id = ConnectionId::new();
        tracing::debug!(connection_id = %id, "creating connection");

        Arc::new(Self {
            id,
            state: RwLock::new(ConnectionState {
                closed: false,
                paused: false,
                last_activity: Instant::now(),
                outbound: Some(tx),
            }),
            closed_signal,
            writer: tokio::sync::Mutex::new(sink),
            reader: Mutex::new(Some(stream)),
            outbound_rx: Mutex::new(Some(rx)),
            paused_dead_threshold: config.paused_dead_threshold,
        })
    }

    /// Returns the connection's identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ConnectionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ConnectionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attempts a non-blocking insert into the outbound buffer.
    ///
    /// A full buffer drops the envelope for this connection only; the
    /// connection's state is untouched. A successful insert counts as
    /// activity.
    pub fn enqueue_for_delivery(&self, envelope: Envelope) -> EnqueueOutcome {
        let mut state = self.write_state();
        if state.closed {
            tracing::trace!(connection_id = %self.id, "enqueue on closed connection ignored");
            return EnqueueOutcome::Closed;
        }
        let Some(outbound) = state.outbound.as_ref() else {
            return EnqueueOutcome::Closed;
        };

        match outbound.try_send(envelope) {
            Ok(()) => {
                state.touch();
                EnqueueOutcome::Queued
            }
            Err(TrySendError::Full(envelope)) => {
                tracing::warn!(
                    connection_id = %self.id,
                    msg_type = envelope.msg_type(),
                    "outbound buffer full, dropping envelope"
                );
                EnqueueOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => EnqueueOutcome::Closed,
        }
    }

    /// Closes the connection. Idempotent.
    ///
    /// Marks the connection closed, closes the outbound buffer so the
    /// outbound task drains out, and signals the inbound task to stop.
    pub fn close(&self) {
        {
            let mut state = self.write_state();
            if state.closed {
                tracing::trace!(connection_id = %self.id, "connection already closed");
                return;
            }
            state.closed = true;
            state.outbound = None;
        }
        self.closed_signal.send_replace(true);
        tracing::debug!(connection_id = %self.id, "connection closed");
    }

    /// Returns `true` once the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.read_state().closed
    }

    /// Returns `true` while the client has paused delivery.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.read_state().paused
    }

    /// Changes the pause flag. No-op on a closed connection.
    pub fn set_paused(&self, paused: bool) {
        let mut state = self.write_state();
        if state.closed {
            tracing::debug!(connection_id = %self.id, "closed connection, pause state unchanged");
            return;
        }
        let was = state.paused;
        state.paused = paused;
        tracing::info!(connection_id = %self.id, was, paused, "pause state changed");
    }

    /// Time of the last observed activity on this connection.
    #[must_use]
    pub fn last_activity(&self) -> Instant {
        self.read_state().last_activity
    }

    /// Number of envelopes waiting in the outbound buffer.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.read_state()
            .outbound
            .as_ref()
            .map_or(0, |tx| tx.max_capacity().saturating_sub(tx.capacity()))
    }

    /// Returns `true` if the connection is eligible for removal: it is
    /// closed, or it is paused and has been silent for longer than the
    /// dead threshold.
    #[must_use]
    pub fn should_drop(&self) -> bool {
        let state = self.read_state();
        if state.closed {
            return true;
        }
        state.paused && state.last_activity.elapsed() > self.paused_dead_threshold
    }

    /// Writes a liveness ping straight to the wire, bypassing the
    /// outbound buffer and its drop policy.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the connection is closed, or
    /// the wire's error if the write fails.
    pub async fn send_ping(&self) -> Result<(), TransportError> {
        let result = self.write_direct(Envelope::heartbeat_ping()).await;
        match &result {
            Ok(()) => tracing::debug!(connection_id = %self.id, "sent ping"),
            Err(err) => tracing::warn!(connection_id = %self.id, %err, "failed to send ping"),
        }
        result
    }

    async fn write_direct(&self, envelope: Envelope) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.writer.lock().await.send(envelope).await
    }

    fn record_activity(&self) {
        let mut state = self.write_state();
        if !state.closed {
            state.touch();
        }
    }

    /// Spawns the inbound and outbound tasks.
    pub fn start(self: &Arc<Self>) {
        tokio::spawn(Arc::clone(self).run_inbound());
        tokio::spawn(Arc::clone(self).run_outbound());
        tracing::debug!(connection_id = %self.id, "connection tasks started");
    }

    /// Reads client envelopes until the stream fails, ends, or the
    /// connection is closed, then closes the connection.
    pub async fn run_inbound(self: Arc<Self>) {
        let stream = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut stream) = stream else {
            tracing::warn!(connection_id = %self.id, "inbound task already running");
            return;
        };
        let mut closed = self.closed_signal.subscribe();

        loop {
            let frame = tokio::select! {
                () = async {
                    let _ = closed.wait_for(|is_closed| *is_closed).await;
                } => break,
                frame = stream.next() => frame,
            };

            match frame {
                Some(Ok(envelope)) => self.handle_inbound(&envelope).await,
                Some(Err(err)) => {
                    tracing::debug!(connection_id = %self.id, %err, "inbound stream failed");
                    break;
                }
                None => {
                    tracing::debug!(connection_id = %self.id, "client closed stream");
                    break;
                }
            }
        }

        self.close();
        tracing::debug!(connection_id = %self.id, "inbound task exiting");
    }

    async fn handle_inbound(&self, envelope: &Envelope) {
        match envelope {
            Envelope::Ping(_) => {
                self.record_activity();
                if let Err(err) = self.write_direct(Envelope::heartbeat_pong()).await {
                    tracing::warn!(connection_id = %self.id, %err, "failed to answer ping");
                    self.close();
                }
            }
            Envelope::Pong(_) => {
                self.record_activity();
                tracing::trace!(connection_id = %self.id, "pong received");
            }
            Envelope::Pause => {
                self.record_activity();
                self.set_paused(true);
            }
            Envelope::Resume => {
                self.record_activity();
                self.set_paused(false);
            }
            Envelope::Log(_) | Envelope::Unknown(_) => {
                tracing::debug!(
                    connection_id = %self.id,
                    msg_type = envelope.msg_type(),
                    "ignoring inbound envelope"
                );
            }
        }
    }

    /// Drains the outbound buffer in order, writing each envelope to the
    /// wire. Stops on the first write failure or once the connection is
    /// closed, then closes the connection and the wire.
    pub async fn run_outbound(self: Arc<Self>) {
        let rx = self
            .outbound_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut rx) = rx else {
            tracing::warn!(connection_id = %self.id, "outbound task already running");
            return;
        };

        while let Some(envelope) = rx.recv().await {
            if self.is_closed() {
                break;
            }
            let mut writer = self.writer.lock().await;
            let msg_type = envelope.msg_type().to_owned();
            if let Err(err) = writer.send(envelope).await {
                tracing::warn!(connection_id = %self.id, %err, "write failed, closing connection");
                self.close();
                break;
            }
            tracing::trace!(connection_id = %self.id, msg_type = %msg_type, "delivered envelope");
        }

        self.close();
        if let Err(err) = self.writer.lock().await.close().await {
            tracing::debug!(connection_id = %self.id, %err, "error closing wire");
        }
        tracing::debug!(connection_id = %self.id, "outbound task exiting");
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .field("paused", &self.is_paused())
            .finish_non_exhaustive()
    }
}
