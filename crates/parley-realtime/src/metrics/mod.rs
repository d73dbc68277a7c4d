//! Realtime engine metrics.

pub mod connections;
pub mod events;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Authenticated connections ever opened
    pub connections_opened: AtomicU64,
    /// Authenticated connections closed
    pub connections_closed: AtomicU64,
    /// Connection attempts rejected at authentication
    pub auth_failures: AtomicU64,
    /// Inbound events dispatched to a handler
    pub events_received: AtomicU64,
    /// Outbound events queued on a connection
    pub events_sent: AtomicU64,
    /// Outbound events dropped (closed connection or full buffer)
    pub events_dropped: AtomicU64,
    /// Handler failures reported back as `operation-failed`
    pub operation_failures: AtomicU64,
    /// Presence snapshots broadcast after an online/offline transition
    pub presence_broadcasts: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Connections currently open.
    pub fn connections_active(&self) -> u64 {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        opened.saturating_sub(closed)
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            connections_active: self.connections_active(),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
            events_sent: self.events_sent.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            operation_failures: self.operation_failures.load(Ordering::Relaxed),
            presence_broadcasts: self.presence_broadcasts.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Connections ever opened
    pub connections_opened: u64,
    /// Connections closed
    pub connections_closed: u64,
    /// Connections currently open
    pub connections_active: u64,
    /// Rejected connection attempts
    pub auth_failures: u64,
    /// Inbound events handled
    pub events_received: u64,
    /// Outbound events queued
    pub events_sent: u64,
    /// Outbound events dropped
    pub events_dropped: u64,
    /// Failed operations
    pub operation_failures: u64,
    /// Presence broadcasts
    pub presence_broadcasts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_connections_track_open_and_close() {
        let metrics = RealtimeMetrics::new();
        connections::record_open(&metrics);
        connections::record_open(&metrics);
        connections::record_close(&metrics);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connections_opened, 2);
        assert_eq!(snapshot.connections_closed, 1);
        assert_eq!(snapshot.connections_active, 1);
    }

    #[test]
    fn test_delivery_outcomes_are_counted_separately() {
        let metrics = RealtimeMetrics::new();
        events::record_delivery(&metrics, true);
        events::record_delivery(&metrics, true);
        events::record_delivery(&metrics, false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_sent, 2);
        assert_eq!(snapshot.events_dropped, 1);
    }
}
