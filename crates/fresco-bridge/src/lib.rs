//! # fresco-bridge
//!
//! Real-time query-invalidation bridge.
//!
//! Maintains one long-lived connection per client session to a push-event
//! Publisher and translates each inbound `invalidate_query` event into a
//! [`QueryCache::invalidate`] call. The bridge is a freshness hint channel,
//! not a correctness-critical path: every failure degrades to silent
//! staleness, never to a crash.
//!
//! - [`InvalidationBridge::connect`] negotiates a transport (WebSocket
//!   preferred, HTTP polling fallback) and returns a [`Connection`] handle
//! - Inbound frames flow through a bounded channel into a single-consumer
//!   processing loop, preserving receipt order
//! - [`Connection::disconnect`] is the sole cancellation primitive:
//!   idempotent, and no invalidation runs after it returns
//! - There is no reconnection or backoff: a dropped transport leaves the
//!   connection `Disconnected` until the caller connects again

#![deny(unsafe_code)]

pub mod bridge;
pub mod cache;
pub mod connection;
pub mod metrics;
pub mod transport;

pub use bridge::InvalidationBridge;
pub use cache::{EntryState, InMemoryQueryCache, NoOpCache, QueryCache};
pub use connection::{Connection, ConnectionState};
pub use transport::TransportMode;
