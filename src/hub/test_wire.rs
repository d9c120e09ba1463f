//! In-memory wire double for connection and hub tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::SinkExt;
use tokio::sync::mpsc;

use super::connection::{WireSink, WireStream};
use crate::domain::Envelope;
use crate::error::TransportError;

/// Test-side ends of a wire created by [`wire`].
pub(crate) struct WireHarness {
    /// Feeds the connection's inbound stream. Dropping it ends the stream.
    pub inbound: mpsc::UnboundedSender<Result<Envelope, TransportError>>,
    /// Everything the connection wrote, in order.
    pub written: mpsc::UnboundedReceiver<Envelope>,
    /// When set, every write fails.
    pub fail_writes: Arc<AtomicBool>,
    /// When set, every write hangs forever.
    pub stall_writes: Arc<AtomicBool>,
}

/// Builds a connected sink/stream pair and its harness.
pub(crate) fn wire() -> (WireSink, WireStream, WireHarness) {
    let (written_tx, written) = mpsc::unbounded_channel();
    let (inbound, inbound_rx) = mpsc::unbounded_channel();
    let fail_writes = Arc::new(AtomicBool::new(false));
    let stall_writes = Arc::new(AtomicBool::new(false));

    let fail = Arc::clone(&fail_writes);
    let stall = Arc::clone(&stall_writes);
    let sink = futures_util::sink::unfold(
        written_tx,
        |tx: mpsc::UnboundedSender<Envelope>, envelope: Envelope| async move {
            let _ = tx.send(envelope);
            Ok::<_, TransportError>(tx)
        },
    )
    .with(move |envelope: Envelope| {
        let failing = fail.load(Ordering::SeqCst);
        let stalling = stall.load(Ordering::SeqCst);
        async move {
            if stalling {
                std::future::pending::<()>().await;
            }
            if failing {
                Err(TransportError::Write("broken pipe".to_string()))
            } else {
                Ok(envelope)
            }
        }
    });

    let stream = futures_util::stream::unfold(
        inbound_rx,
        |mut rx: mpsc::UnboundedReceiver<Result<Envelope, TransportError>>| async move {
            rx.recv().await.map(|item| (item, rx))
        },
    );

    (
        Box::pin(sink),
        Box::pin(stream),
        WireHarness {
            inbound,
            written,
            fail_writes,
            stall_writes,
        },
    )
}

/// Sends a client envelope into the connection.
pub(crate) fn push(harness: &WireHarness, envelope: Envelope) {
    let _ = harness.inbound.send(Ok(envelope));
}

/// Polls `condition` until it holds, yielding to other tasks between
/// checks. Gives up after five seconds of wall time.
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    let poll = async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    assert!(
        tokio::time::timeout(Duration::from_secs(5), poll).await.is_ok(),
        "condition not reached in time"
    );
}
