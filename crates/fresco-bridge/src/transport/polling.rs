//! Repeated HTTP polling transport (fallback).
//!
//! Issues `GET <base_url>/events/poll` on a fixed interval. The response body
//! is a JSON array of event envelopes; each element becomes one frame, in
//! array order. There is no cursor and no replay: events emitted between
//! polls that the server no longer holds are lost, matching the WebSocket
//! path's no-buffering semantics.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use fresco_core::TransportError;

use super::{FrameStream, Transport, TransportMode, join_path};

/// HTTP polling event-channel transport.
#[derive(Debug)]
pub struct PollingTransport {
    url: String,
    bearer_token: Option<String>,
    interval: Duration,
    client: reqwest::Client,
}

struct PollState {
    url: String,
    bearer_token: Option<String>,
    client: reqwest::Client,
    interval: tokio::time::Interval,
    pending: VecDeque<String>,
    failed: bool,
}

impl PollingTransport {
    /// Build a transport for `<base_url>/events/poll`.
    #[must_use]
    pub fn new(base_url: &str, bearer_token: Option<String>, interval: Duration) -> Self {
        Self {
            url: join_path(base_url, "events/poll"),
            bearer_token,
            interval,
            client: reqwest::Client::new(),
        }
    }

    /// The resolved polling endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for PollingTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::Polling
    }

    async fn open(&self) -> Result<FrameStream, TransportError> {
        // The first poll doubles as the handshake: if the endpoint is
        // unreachable, `connect` fails instead of yielding a dead stream.
        let first = poll_once(&self.client, &self.url, self.bearer_token.as_deref()).await?;
        debug!(url = %self.url, frames = first.len(), "polling handshake complete");

        let mut interval = tokio::time::interval(self.interval);
        // The first tick of a tokio interval fires immediately; consume it so
        // the next poll waits a full period.
        let _ = interval.tick().await;

        let state = PollState {
            url: self.url.clone(),
            bearer_token: self.bearer_token.clone(),
            client: self.client.clone(),
            interval,
            pending: first.into(),
            failed: false,
        };

        let frames = futures::stream::unfold(state, |mut st| async move {
            if st.failed {
                return None;
            }
            loop {
                if let Some(frame) = st.pending.pop_front() {
                    return Some((Ok(frame), st));
                }
                let _ = st.interval.tick().await;
                match poll_once(&st.client, &st.url, st.bearer_token.as_deref()).await {
                    Ok(frames) => st.pending.extend(frames),
                    Err(err) => {
                        st.failed = true;
                        return Some((Err(err), st));
                    }
                }
            }
        });
        Ok(Box::pin(frames))
    }
}

/// One poll round: GET the endpoint, split the body into frames.
async fn poll_once(
    client: &reqwest::Client,
    url: &str,
    bearer_token: Option<&str>,
) -> Result<Vec<String>, TransportError> {
    let mut request = client.get(url);
    if let Some(token) = bearer_token {
        request = request.bearer_auth(token);
    }
    let response = request
        .send()
        .await
        .map_err(|e| TransportError::Handshake {
            url: url.to_owned(),
            detail: e.to_string(),
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
        });
    }
    let body: serde_json::Value =
        response
            .json()
            .await
            .map_err(|e| TransportError::StreamClosed {
                detail: e.to_string(),
            })?;
    Ok(match body {
        serde_json::Value::Array(items) => items.iter().map(ToString::to_string).collect(),
        // A single envelope object is tolerated; the frame parser classifies it.
        other => vec![other.to_string()],
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
