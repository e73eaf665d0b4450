//! Bridge wiring: transport negotiation, the reader task, and the
//! single-consumer processing loop.
//!
//! Inbound frames are parsed on the reader task and queued as typed
//! [`InvalidationEvent`]s on a bounded channel. One processing task consumes
//! the channel and calls [`QueryCache::invalidate`] exactly once per event,
//! in receipt order. A full channel drops the frame (freshness hint, not a
//! correctness path). Transport errors end the connection; there is no
//! reconnect and no buffering across the gap.

use std::sync::Arc;

use futures::StreamExt;
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use fresco_core::events::{InvalidationEvent, ParsedFrame, parse_frame};
use fresco_core::{BridgeError, Result, TransportError};
use fresco_settings::{CredentialsMode, EventsSettings, FrescoSettings, TransportPreference};

use crate::cache::QueryCache;
use crate::connection::Connection;
use crate::metrics::{
    BRIDGE_CONNECTIONS_TOTAL, BRIDGE_DROPPED_EVENTS_TOTAL, BRIDGE_INVALIDATIONS_TOTAL,
    BRIDGE_MALFORMED_EVENTS_TOTAL, BRIDGE_TRANSPORT_ERRORS_TOTAL,
};
use crate::transport::{
    FrameStream, PollingTransport, Transport, TransportMode, WebSocketTransport,
};

/// Connects push-event sources to a query cache.
///
/// One bridge can open any number of connections; each connection is
/// independent and terminal once disconnected. The cache is injected per
/// connection so the bridge itself holds no shared mutable state.
pub struct InvalidationBridge {
    settings: EventsSettings,
}

impl InvalidationBridge {
    /// Build a bridge from event-channel settings.
    #[must_use]
    pub fn new(settings: EventsSettings) -> Self {
        Self { settings }
    }

    /// Build a bridge from full application settings.
    #[must_use]
    pub fn from_settings(settings: &FrescoSettings) -> Self {
        Self::new(settings.events.clone())
    }

    /// Establish a connection and begin delivering invalidations to `cache`.
    ///
    /// Negotiates WebSocket first and falls back to HTTP polling when the
    /// settings allow it. Returns once the handshake has succeeded and both
    /// bridge tasks are running.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] if no permitted transport could
    /// complete its handshake. Connect failures are terminal: the caller
    /// decides if and when to try again.
    pub async fn connect(&self, cache: Arc<dyn QueryCache>) -> Result<Arc<Connection>> {
        let (mode, stream) = self.negotiate().await?;
        counter!(BRIDGE_CONNECTIONS_TOTAL, "mode" => mode.label()).increment(1);

        let connection = Arc::new(Connection::new(mode));
        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(1));

        connection.attach_task(tokio::spawn(run_reader(
            stream,
            tx,
            Arc::clone(&connection),
        )));
        connection.attach_task(tokio::spawn(run_processor(
            rx,
            cache,
            Arc::clone(&connection),
        )));
        connection.mark_connected();

        info!(
            conn_id = %connection.id(),
            mode = mode.label(),
            url = %self.settings.base_url,
            "invalidation bridge connected"
        );
        Ok(connection)
    }

    /// Pick a transport per the configured preference and open it.
    async fn negotiate(&self) -> Result<(TransportMode, FrameStream)> {
        match self.settings.transport {
            TransportPreference::WebSocketOnly => {
                let stream = self.websocket()?.open().await.map_err(on_connect_error)?;
                Ok((TransportMode::WebSocket, stream))
            }
            TransportPreference::PollingOnly => {
                let stream = self.polling().open().await.map_err(on_connect_error)?;
                Ok((TransportMode::Polling, stream))
            }
            TransportPreference::WebSocketWithFallback => {
                match self.websocket()?.open().await {
                    Ok(stream) => Ok((TransportMode::WebSocket, stream)),
                    Err(err) => {
                        counter!(BRIDGE_TRANSPORT_ERRORS_TOTAL).increment(1);
                        warn!(error = %err, "websocket handshake failed, falling back to polling");
                        let stream = self.polling().open().await.map_err(on_connect_error)?;
                        Ok((TransportMode::Polling, stream))
                    }
                }
            }
        }
    }

    fn websocket(&self) -> Result<WebSocketTransport> {
        WebSocketTransport::new(&self.settings.base_url, self.bearer_token())
            .map_err(BridgeError::Transport)
    }

    fn polling(&self) -> PollingTransport {
        PollingTransport::new(
            &self.settings.base_url,
            self.bearer_token(),
            std::time::Duration::from_millis(self.settings.poll_interval_ms),
        )
    }

    fn bearer_token(&self) -> Option<String> {
        match self.settings.credentials {
            CredentialsMode::Include => self.settings.bearer_token.clone(),
            CredentialsMode::Omit => None,
        }
    }
}

/// Record a failed handshake and wrap it for the caller.
fn on_connect_error(err: TransportError) -> BridgeError {
    counter!(BRIDGE_TRANSPORT_ERRORS_TOTAL).increment(1);
    warn!(error = %err, "event channel connect failed");
    BridgeError::Transport(err)
}

/// Reader task: parse frames, stamp receipt order, queue typed events.
///
/// Exits on stream end, transport error, or cancellation; on exit the
/// connection is `Disconnected` and the channel sender is dropped, which lets
/// the processor drain and stop.
async fn run_reader(
    mut stream: FrameStream,
    tx: mpsc::Sender<InvalidationEvent>,
    connection: Arc<Connection>,
) {
    let cancel = connection.cancel_token();
    loop {
        let item = tokio::select! {
            item = stream.next() => item,
            () = cancel.cancelled() => break,
        };
        match item {
            None => {
                info!(conn_id = %connection.id(), "event stream ended");
                break;
            }
            Some(Err(err)) => {
                counter!(BRIDGE_TRANSPORT_ERRORS_TOTAL).increment(1);
                warn!(conn_id = %connection.id(), error = %err, "event stream failed");
                break;
            }
            Some(Ok(frame)) => match parse_frame(&frame) {
                Ok(ParsedFrame::Invalidate(key)) => {
                    let seq = connection.record_received();
                    let event = InvalidationEvent::received(key, connection.id().clone(), seq);
                    if tx.try_send(event).is_err() {
                        counter!(BRIDGE_DROPPED_EVENTS_TOTAL).increment(1);
                        let dropped = connection.record_dropped();
                        warn!(
                            conn_id = %connection.id(),
                            total_drops = dropped,
                            "event channel full, dropping invalidation"
                        );
                    }
                }
                Ok(ParsedFrame::Ignored { event }) => {
                    debug!(conn_id = %connection.id(), event, "ignoring unhandled event");
                }
                Err(err) => {
                    counter!(BRIDGE_MALFORMED_EVENTS_TOTAL).increment(1);
                    warn!(conn_id = %connection.id(), error = %err, "dropping malformed event frame");
                }
            },
        }
    }
    connection.mark_disconnected();
}

/// Processing loop: one `invalidate` call per event, in channel order.
///
/// The invalidation gate plus cancellation check gives `disconnect()` its
/// guarantee: once it returns, no event — queued or in flight — mutates the
/// cache.
async fn run_processor(
    mut rx: mpsc::Receiver<InvalidationEvent>,
    cache: Arc<dyn QueryCache>,
    connection: Arc<Connection>,
) {
    let cancel = connection.cancel_token();
    while let Some(event) = rx.recv().await {
        {
            let _gate = connection.invalidation_gate().lock();
            if cancel.is_cancelled() {
                break;
            }
            cache.invalidate(&event.key);
        }
        counter!(BRIDGE_INVALIDATIONS_TOTAL).increment(1);
        debug!(
            conn_id = %event.connection_id,
            key = %event.key,
            seq = event.seq,
            "query invalidated"
        );
    }
    debug!(conn_id = %connection.id(), "processing loop stopped");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
