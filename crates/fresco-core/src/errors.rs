//! Error hierarchy for the fresco bridge.
//!
//! Built on [`thiserror`]:
//!
//! - [`BridgeError`]: top-level enum covering all error domains
//! - [`TransportError`]: connection could not be established or dropped
//! - [`EventParseError`]: inbound frame does not parse as an event envelope
//!
//! Per the bridge's failure policy none of these are fatal to the host
//! process: transport errors end the connection (no retry), parse errors drop
//! the offending frame, and both degrade to stale-cache-until-next-fetch.

use thiserror::Error;

/// Top-level error type for the fresco bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Transport-level failure (handshake, drop, HTTP status).
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Inbound frame failed to parse.
    #[error("{0}")]
    Parse(#[from] EventParseError),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors establishing or using a transport.
///
/// Carries string detail rather than transport-library error types so that
/// `fresco-core` stays free of transport dependencies.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint URL could not be parsed or has the wrong scheme.
    #[error("invalid endpoint URL {url:?}: {detail}")]
    BadUrl {
        /// The offending URL.
        url: String,
        /// What was wrong with it.
        detail: String,
    },

    /// The transport handshake failed.
    #[error("handshake with {url} failed: {detail}")]
    Handshake {
        /// Endpoint the handshake targeted.
        url: String,
        /// Underlying failure description.
        detail: String,
    },

    /// The server answered with a non-success HTTP status.
    #[error("server returned HTTP {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// An established stream dropped.
    #[error("stream closed: {detail}")]
    StreamClosed {
        /// Underlying failure description.
        detail: String,
    },
}

/// Errors parsing an inbound event frame.
#[derive(Debug, Error)]
pub enum EventParseError {
    /// The frame body is not valid JSON.
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The frame parsed as JSON but is not an event envelope.
    #[error("invalid event envelope: {detail}")]
    InvalidEnvelope {
        /// What was missing or wrong.
        detail: String,
    },

    /// The `key` field is not an ordered array of strings.
    #[error("malformed cache key: {detail}")]
    MalformedKey {
        /// What was wrong with the key.
        detail: String,
    },

    /// The `key` field is an empty array.
    #[error("cache key must have at least one segment")]
    EmptyKey,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn transport_error_display() {
        let err = TransportError::Handshake {
            url: "ws://localhost:4620/events".into(),
            detail: "connection refused".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ws://localhost:4620/events"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn status_error_display() {
        let err = TransportError::Status { status: 503 };
        assert_eq!(err.to_string(), "server returned HTTP 503");
    }

    #[test]
    fn parse_error_from_serde() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: EventParseError = json_err.into();
        assert_matches!(err, EventParseError::InvalidJson(_));
    }

    #[test]
    fn bridge_error_from_transport() {
        let err: BridgeError = TransportError::Status { status: 500 }.into();
        assert_matches!(err, BridgeError::Transport(_));
    }

    #[test]
    fn bridge_error_from_parse() {
        let err: BridgeError = EventParseError::EmptyKey.into();
        assert_matches!(err, BridgeError::Parse(_));
        assert!(err.to_string().contains("at least one segment"));
    }
}
