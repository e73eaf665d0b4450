//! Invalidation events and their wire envelope.
//!
//! The Publisher sends one JSON object per event:
//!
//! ```json
//! {"event": "invalidate_query", "key": ["orders", "all"]}
//! ```
//!
//! [`parse_frame`] classifies an inbound frame as an invalidation, an ignored
//! (unknown-name) event, or a parse error. Unknown event names are not errors
//! so the Publisher can add event types without breaking older bridges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::EventParseError;
use crate::ids::ConnectionId;
use crate::keys::QueryKey;

/// Wire name of the invalidation event.
pub const EVENT_INVALIDATE_QUERY: &str = "invalidate_query";

/// Raw wire envelope, before key validation.
///
/// `key` stays a raw JSON value here so malformed shapes (bare string, mixed
/// array) can be classified rather than rejected opaquely by serde.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event name, e.g. `"invalidate_query"`.
    pub event: String,
    /// Cache-key descriptor payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<serde_json::Value>,
}

impl EventEnvelope {
    /// Build an `invalidate_query` envelope for a key (publisher/test side).
    #[must_use]
    pub fn invalidate(key: &QueryKey) -> Self {
        Self {
            event: EVENT_INVALIDATE_QUERY.to_owned(),
            key: Some(serde_json::json!(key.segments())),
        }
    }
}

/// Outcome of parsing a well-formed frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedFrame {
    /// An `invalidate_query` event with a valid key.
    Invalidate(QueryKey),
    /// A well-formed envelope with an event name this bridge does not handle.
    Ignored {
        /// The unrecognized event name.
        event: String,
    },
}

/// Parse one inbound text frame into a [`ParsedFrame`].
///
/// # Errors
///
/// Returns [`EventParseError`] when the frame is not JSON, not an envelope,
/// or names `invalidate_query` with a missing or malformed key.
pub fn parse_frame(text: &str) -> Result<ParsedFrame, EventParseError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    // Serde's derived struct impl also accepts the sequence form, which would
    // let an array frame masquerade as an envelope. Envelopes are objects.
    if !value.is_object() {
        return Err(EventParseError::InvalidEnvelope {
            detail: format!("expected object, got {}", crate::keys::type_name(&value)),
        });
    }
    let envelope: EventEnvelope = serde_json::from_value(value)?;
    if envelope.event != EVENT_INVALIDATE_QUERY {
        return Ok(ParsedFrame::Ignored {
            event: envelope.event,
        });
    }
    let key = envelope.key.ok_or_else(|| EventParseError::InvalidEnvelope {
        detail: "invalidate_query event is missing its key".into(),
    })?;
    Ok(ParsedFrame::Invalidate(QueryKey::from_wire(&key)?))
}

/// A single invalidation delivered to the processing loop.
///
/// Constructed on receipt; consumed exactly once; never persisted.
#[derive(Clone, Debug)]
pub struct InvalidationEvent {
    /// The cache key to invalidate.
    pub key: QueryKey,
    /// The connection this event arrived on.
    pub connection_id: ConnectionId,
    /// Receipt order within the connection (starts at 1).
    pub seq: u64,
    /// When the bridge received the frame.
    pub received_at: DateTime<Utc>,
}

impl InvalidationEvent {
    /// Stamp a received key with connection and sequence metadata.
    #[must_use]
    pub fn received(key: QueryKey, connection_id: ConnectionId, seq: u64) -> Self {
        Self {
            key,
            connection_id,
            seq,
            received_at: Utc::now(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
