//! Query cache seam and reference implementations.
//!
//! The bridge's only permitted cache mutation is "mark key stale". The
//! [`QueryCache`] trait captures exactly that: one idempotent method that is
//! a silent no-op for untracked keys. The cache serializes its own mutations;
//! callers need no external locking.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use fresco_core::QueryKey;

/// A key-addressed cache of asynchronously fetched data.
///
/// Implementations own their fetch/staleness policy; the bridge only signals
/// staleness. `invalidate` must be idempotent and must treat untracked keys
/// as a successful no-op.
pub trait QueryCache: Send + Sync {
    /// Mark every entry matching `key` (exact or under its prefix) stale.
    fn invalidate(&self, key: &QueryKey);
}

/// Freshness state of a tracked cache entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryState {
    /// Entry is current; reads serve it directly.
    Fresh,
    /// Entry was invalidated; the next access triggers a refetch.
    Stale,
}

/// In-memory reference implementation of [`QueryCache`].
///
/// Tracks keys registered via [`track`](Self::track) and flips them to
/// [`EntryState::Stale`] on invalidation. Invalidation is prefix-aware:
/// invalidating `["orders"]` also marks `["orders", "all"]` stale. Every
/// accepted invalidation is appended to a log so tests can assert call
/// counts and ordering.
#[derive(Default)]
pub struct InMemoryQueryCache {
    entries: RwLock<HashMap<QueryKey, EntryState>>,
    invalidation_log: Mutex<Vec<QueryKey>>,
}

impl InMemoryQueryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key as tracked, starting fresh.
    pub fn track(&self, key: QueryKey) {
        let _ = self.entries.write().insert(key, EntryState::Fresh);
    }

    /// Current state of a tracked key, or `None` if untracked.
    #[must_use]
    pub fn state(&self, key: &QueryKey) -> Option<EntryState> {
        self.entries.read().get(key).copied()
    }

    /// Mark a key fresh again (simulates a completed refetch).
    pub fn refresh(&self, key: &QueryKey) {
        if let Some(state) = self.entries.write().get_mut(key) {
            *state = EntryState::Fresh;
        }
    }

    /// Every key passed to [`QueryCache::invalidate`], in call order.
    ///
    /// Includes no-op invalidations of untracked keys; the log records the
    /// calls the bridge made, not their effect.
    #[must_use]
    pub fn invalidations(&self) -> Vec<QueryKey> {
        self.invalidation_log.lock().clone()
    }

    /// Number of tracked entries currently stale.
    #[must_use]
    pub fn stale_count(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|s| **s == EntryState::Stale)
            .count()
    }
}

impl QueryCache for InMemoryQueryCache {
    fn invalidate(&self, key: &QueryKey) {
        self.invalidation_log.lock().push(key.clone());
        let mut entries = self.entries.write();
        let mut marked = 0usize;
        for (entry_key, state) in entries.iter_mut() {
            if key.is_prefix_of(entry_key) {
                *state = EntryState::Stale;
                marked += 1;
            }
        }
        debug!(%key, marked, "cache invalidation");
    }
}

/// A [`QueryCache`] that ignores every invalidation.
#[derive(Debug, Default, Clone)]
pub struct NoOpCache;

impl QueryCache for NoOpCache {
    fn invalidate(&self, _key: &QueryKey) {}
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
