//! Transport negotiation for the event channel.
//!
//! A transport turns an endpoint into a stream of raw text frames. The
//! bridge prefers the persistent WebSocket stream and can fall back to
//! repeated HTTP polling; both yield frames in publisher order and both stop
//! at the first transport error (no retry, by design).

pub mod polling;
pub mod websocket;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use fresco_core::TransportError;

pub use polling::PollingTransport;
pub use websocket::WebSocketTransport;

/// Which channel the connection negotiated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Persistent bidirectional stream (preferred).
    WebSocket,
    /// Repeated HTTP polling (fallback).
    Polling,
}

impl TransportMode {
    /// Label for logs and metrics.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::WebSocket => "websocket",
            Self::Polling => "polling",
        }
    }
}

/// Stream of raw inbound text frames.
///
/// `Err` items are terminal: the bridge logs them and stops reading.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// An event-channel transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The mode this transport implements.
    fn mode(&self) -> TransportMode;

    /// Perform the handshake and return the frame stream.
    async fn open(&self) -> Result<FrameStream, TransportError>;
}

/// Append the events path to a configured base URL.
pub(crate) fn join_path(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}
