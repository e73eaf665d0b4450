//! Metric name constants for the bridge.
//!
//! Recorded via the [`metrics`] facade; installing a recorder (Prometheus or
//! otherwise) is the host application's concern.

/// Invalidations applied to the cache (counter).
pub const BRIDGE_INVALIDATIONS_TOTAL: &str = "bridge_invalidations_total";
/// Frames dropped because they failed to parse (counter).
pub const BRIDGE_MALFORMED_EVENTS_TOTAL: &str = "bridge_malformed_events_total";
/// Transport-level failures, connect or mid-stream (counter).
pub const BRIDGE_TRANSPORT_ERRORS_TOTAL: &str = "bridge_transport_errors_total";
/// Events dropped because the inbound channel was full (counter).
pub const BRIDGE_DROPPED_EVENTS_TOTAL: &str = "bridge_dropped_events_total";
/// Connections established (counter, labels: mode).
pub const BRIDGE_CONNECTIONS_TOTAL: &str = "bridge_connections_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_constants_are_snake_case() {
        let names = [
            BRIDGE_INVALIDATIONS_TOTAL,
            BRIDGE_MALFORMED_EVENTS_TOTAL,
            BRIDGE_TRANSPORT_ERRORS_TOTAL,
            BRIDGE_DROPPED_EVENTS_TOTAL,
            BRIDGE_CONNECTIONS_TOTAL,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
        }
    }
}
