//! Per-session connection handle and lifecycle state.
//!
//! State machine: `Idle → Connecting → Connected → Disconnected`.
//! `Disconnected` is terminal — there is no transition back to `Connecting`.
//! Reconnection, if a host wants it, is an external policy layered on top.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fresco_core::ConnectionId;

use crate::transport::TransportMode;

/// Default timeout when waiting for bridge tasks to finish after disconnect.
const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness state of a bridge connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, not yet connecting.
    Idle,
    /// Transport handshake in progress.
    Connecting,
    /// Live; events are being delivered.
    Connected,
    /// Terminal. No events are delivered and no retry is attempted.
    Disconnected,
}

/// Handle to one live (or finished) bridge connection.
///
/// Cheap to share behind an `Arc`. [`disconnect`](Self::disconnect) is the
/// sole cancellation primitive: it is idempotent, and once it returns no
/// further cache invalidation will run on behalf of this connection.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    mode: TransportMode,
    state: Mutex<ConnectionState>,
    cancel: CancellationToken,
    /// Held by the processing loop around each cache mutation; `disconnect`
    /// acquires it after cancelling so in-flight invalidations finish first.
    gate: Mutex<()>,
    connected_at: Instant,
    received: AtomicU64,
    dropped: AtomicU64,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Connection {
    /// Create a handle in the `Connecting` state.
    #[must_use]
    pub(crate) fn new(mode: TransportMode) -> Self {
        Self {
            id: ConnectionId::new(),
            mode,
            state: Mutex::new(ConnectionState::Connecting),
            cancel: CancellationToken::new(),
            gate: Mutex::new(()),
            connected_at: Instant::now(),
            received: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Unique connection ID.
    #[must_use]
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Negotiated transport mode.
    #[must_use]
    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Whether events are still being delivered.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.state() == ConnectionState::Connected && !self.cancel.is_cancelled()
    }

    /// Connection age.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Well-formed invalidation events received on this connection.
    #[must_use]
    pub fn received_count(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Events dropped because the inbound channel was full.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Tear down the connection.
    ///
    /// Idempotent. Blocks briefly until any in-flight invalidation has
    /// finished, so after this returns the cache is no longer mutated on
    /// behalf of this connection.
    pub fn disconnect(&self) {
        self.cancel.cancel();
        drop(self.gate.lock());
        let mut state = self.state.lock();
        if *state != ConnectionState::Disconnected {
            info!(conn_id = %self.id, "bridge connection disconnected");
            *state = ConnectionState::Disconnected;
        }
    }

    /// Wait for the reader and processing tasks to finish.
    ///
    /// Call after [`disconnect`](Self::disconnect) when a host wants a fully
    /// drained teardown. Tasks still running after `timeout` are left to the
    /// runtime (they observe the cancelled token on their next iteration).
    pub async fn join(&self, timeout: Option<Duration>) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        if handles.is_empty() {
            return;
        }
        let timeout = timeout.unwrap_or(DEFAULT_JOIN_TIMEOUT);
        let drain = futures::future::join_all(handles);
        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!(conn_id = %self.id, "bridge tasks still running after {timeout:?}");
        }
    }

    // ── crate-internal lifecycle hooks ──────────────────────────────────────

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn invalidation_gate(&self) -> &Mutex<()> {
        &self.gate
    }

    /// Transition `Connecting → Connected`. `Disconnected` is terminal: a
    /// reader that already observed a dead stream wins over a late caller.
    pub(crate) fn mark_connected(&self) {
        let mut state = self.state.lock();
        if *state == ConnectionState::Connecting {
            *state = ConnectionState::Connected;
        }
    }

    pub(crate) fn mark_disconnected(&self) {
        *self.state.lock() = ConnectionState::Disconnected;
    }

    pub(crate) fn record_received(&self) -> u64 {
        self.received.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn attach_task(&self, handle: JoinHandle<()>) {
        self.tasks.lock().push(handle);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection() -> Connection {
        Connection::new(TransportMode::WebSocket)
    }

    #[test]
    fn starts_connecting() {
        let conn = make_connection();
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert!(!conn.is_live());
    }

    #[test]
    fn mark_connected_goes_live() {
        let conn = make_connection();
        conn.mark_connected();
        assert_eq!(conn.state(), ConnectionState::Connected);
        assert!(conn.is_live());
    }

    #[test]
    fn disconnect_is_terminal() {
        let conn = make_connection();
        conn.mark_connected();
        conn.disconnect();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!conn.is_live());
        assert!(conn.cancel_token().is_cancelled());
    }

    #[test]
    fn disconnect_twice_is_idempotent() {
        let conn = make_connection();
        conn.mark_connected();
        conn.disconnect();
        conn.disconnect();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn disconnected_is_not_resurrected_by_mark_connected() {
        let conn = make_connection();
        conn.mark_disconnected();
        conn.mark_connected();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!conn.is_live());
    }

    #[test]
    fn counters_accumulate() {
        let conn = make_connection();
        assert_eq!(conn.record_received(), 1);
        assert_eq!(conn.record_received(), 2);
        assert_eq!(conn.record_dropped(), 1);
        assert_eq!(conn.received_count(), 2);
        assert_eq!(conn.dropped_count(), 1);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(make_connection().id(), make_connection().id());
    }

    #[test]
    fn age_increases() {
        let conn = make_connection();
        let age1 = conn.age();
        std::thread::sleep(Duration::from_millis(5));
        assert!(conn.age() > age1);
    }

    #[tokio::test]
    async fn join_with_no_tasks_returns() {
        let conn = make_connection();
        conn.join(None).await;
    }

    #[tokio::test]
    async fn join_awaits_attached_tasks() {
        let conn = make_connection();
        let token = conn.cancel_token();
        conn.attach_task(tokio::spawn(async move {
            token.cancelled().await;
        }));
        conn.disconnect();
        conn.join(Some(Duration::from_secs(1))).await;
    }

    #[tokio::test]
    async fn join_times_out_on_stuck_task() {
        let conn = make_connection();
        conn.attach_task(tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(300)).await;
        }));
        conn.join(Some(Duration::from_millis(50))).await;
    }

    #[test]
    fn disconnect_waits_for_gate_holder() {
        use std::sync::Arc;
        let conn = Arc::new(make_connection());
        conn.mark_connected();

        // Simulate an in-flight invalidation holding the gate.
        let guard = conn.invalidation_gate().lock();
        let conn2 = Arc::clone(&conn);
        let handle = std::thread::spawn(move || {
            conn2.disconnect();
        });
        // disconnect() must not complete while the gate is held.
        std::thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());
        drop(guard);
        handle.join().unwrap();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }
}
