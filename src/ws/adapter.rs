//! Adapts an axum [`WebSocket`] into the hub's wire abstraction.
//!
//! Outbound envelopes become JSON text frames. Inbound text frames are
//! decoded into envelopes; frames that are not valid envelopes are skipped,
//! and a close frame or socket error ends the connection.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt, future};

use crate::domain::Envelope;
use crate::error::TransportError;
use crate::hub::{WireSink, WireStream};

/// Splits a WebSocket into the sink and stream a
/// [`crate::hub::Connection`] runs on.
pub fn split_socket(socket: WebSocket) -> (WireSink, WireStream) {
    let (ws_tx, ws_rx) = socket.split();

    let sink = ws_tx
        .sink_map_err(|err| TransportError::Write(err.to_string()))
        .with(|envelope: Envelope| future::ready(envelope.to_json().map(Message::text)));

    let stream = ws_rx.filter_map(|frame| future::ready(decode_frame(frame)));

    (Box::pin(sink), Box::pin(stream))
}

/// Maps one WebSocket frame to an inbound item, or `None` to skip it.
fn decode_frame(frame: Result<Message, axum::Error>) -> Option<Result<Envelope, TransportError>> {
    match frame {
        Ok(Message::Text(text)) => match Envelope::from_json(text.as_str()) {
            Ok(envelope) => Some(Ok(envelope)),
            Err(err) => {
                tracing::debug!(%err, "skipping malformed frame");
                None
            }
        },
        Ok(Message::Close(_)) => Some(Err(TransportError::Closed)),
        Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_)) => None,
        Err(err) => Some(Err(TransportError::Read(err.to_string()))),
    }
}
