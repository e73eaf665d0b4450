//! Typed settings for the fresco bridge.

use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrescoSettings {
    /// Event channel settings.
    pub events: EventsSettings,
}

/// Whether session credentials are attached to the event channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialsMode {
    /// Do not attach credentials (anonymous sessions).
    #[default]
    Omit,
    /// Attach the bearer token to the transport handshake.
    Include,
}

/// Which transports the bridge may use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportPreference {
    /// Prefer WebSocket; fall back to HTTP polling if the handshake fails.
    #[default]
    WebSocketWithFallback,
    /// WebSocket only; a failed handshake is a connect failure.
    WebSocketOnly,
    /// HTTP polling only.
    PollingOnly,
}

/// Event channel network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventsSettings {
    /// Base URL of the event publisher (`http://` or `https://`).
    pub base_url: String,
    /// Credentials attachment mode.
    pub credentials: CredentialsMode,
    /// Bearer token sent when `credentials` is `Include`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    /// Transport negotiation preference.
    pub transport: TransportPreference,
    /// Polling interval in milliseconds (polling transport only).
    pub poll_interval_ms: u64,
    /// Capacity of the inbound event channel.
    pub channel_capacity: usize,
}

impl Default for EventsSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4620".to_string(),
            credentials: CredentialsMode::Omit,
            bearer_token: None,
            transport: TransportPreference::WebSocketWithFallback,
            poll_interval_ms: 3000,
            channel_capacity: 256,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
