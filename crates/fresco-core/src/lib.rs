//! # fresco-core
//!
//! Foundation types for the fresco query-invalidation bridge.
//!
//! This crate provides the shared vocabulary the other fresco crates depend on:
//!
//! - **Query keys**: [`QueryKey`] — ordered string segments identifying a
//!   cached resource, with exact and prefix matching
//! - **Branded IDs**: [`ConnectionId`] as a newtype for type safety
//! - **Events**: [`InvalidationEvent`] and the `invalidate_query` wire envelope
//! - **Errors**: [`BridgeError`] hierarchy via `thiserror`

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod ids;
pub mod keys;

pub use errors::{BridgeError, EventParseError, Result, TransportError};
pub use events::{EventEnvelope, InvalidationEvent, ParsedFrame};
pub use ids::ConnectionId;
pub use keys::QueryKey;
