//! Persistent WebSocket transport (preferred).
//!
//! Connects to `<base_url>/events` with the scheme rewritten to `ws`/`wss`.
//! Only text frames carry events; binary frames are ignored and ping/pong is
//! handled by the protocol library.

use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tracing::debug;

use fresco_core::TransportError;

use super::{FrameStream, Transport, TransportMode, join_path};

/// WebSocket event-channel transport.
#[derive(Debug)]
pub struct WebSocketTransport {
    url: String,
    bearer_token: Option<String>,
}

impl WebSocketTransport {
    /// Build a transport for `<base_url>/events`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::BadUrl`] if the base URL does not use an
    /// `http(s)` or `ws(s)` scheme.
    pub fn new(base_url: &str, bearer_token: Option<String>) -> Result<Self, TransportError> {
        Ok(Self {
            url: join_path(&ws_base_url(base_url)?, "events"),
            bearer_token,
        })
    }

    /// The resolved WebSocket endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::WebSocket
    }

    async fn open(&self) -> Result<FrameStream, TransportError> {
        let mut request =
            self.url
                .as_str()
                .into_client_request()
                .map_err(|e| TransportError::BadUrl {
                    url: self.url.clone(),
                    detail: e.to_string(),
                })?;
        if let Some(token) = &self.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                TransportError::BadUrl {
                    url: self.url.clone(),
                    detail: format!("bearer token is not a valid header value: {e}"),
                }
            })?;
            let _ = request.headers_mut().insert("authorization", value);
        }

        let (ws, _response) =
            connect_async(request)
                .await
                .map_err(|e| TransportError::Handshake {
                    url: self.url.clone(),
                    detail: e.to_string(),
                })?;
        debug!(url = %self.url, "websocket handshake complete");

        let frames = ws.filter_map(|item| async move {
            match item {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                // Normal close: end the stream rather than surface an error.
                Ok(Message::Close(_)) => None,
                Ok(_) => None,
                Err(e) => Some(Err(TransportError::StreamClosed {
                    detail: e.to_string(),
                })),
            }
        });
        Ok(Box::pin(frames))
    }
}

/// Rewrite an `http(s)` base URL to `ws(s)`.
fn ws_base_url(base_url: &str) -> Result<String, TransportError> {
    if let Some(rest) = base_url.strip_prefix("http://") {
        Ok(format!("ws://{rest}"))
    } else if let Some(rest) = base_url.strip_prefix("https://") {
        Ok(format!("wss://{rest}"))
    } else if base_url.starts_with("ws://") || base_url.starts_with("wss://") {
        Ok(base_url.to_owned())
    } else {
        Err(TransportError::BadUrl {
            url: base_url.to_owned(),
            detail: "expected http(s) or ws(s) scheme".into(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
