//! Event metrics helpers.

use std::sync::atomic::Ordering;

use super::RealtimeMetrics;

/// Record an inbound event reaching a handler
pub fn record_received(metrics: &RealtimeMetrics) {
    metrics.events_received.fetch_add(1, Ordering::Relaxed);
}

/// Record the outcome of queueing one outbound event
pub fn record_delivery(metrics: &RealtimeMetrics, delivered: bool) {
    if delivered {
        metrics.events_sent.fetch_add(1, Ordering::Relaxed);
    } else {
        metrics.events_dropped.fetch_add(1, Ordering::Relaxed);
    }
}

/// Record a handler failure
pub fn record_failure(metrics: &RealtimeMetrics) {
    metrics.operation_failures.fetch_add(1, Ordering::Relaxed);
}

/// Record a presence broadcast
pub fn record_presence_broadcast(metrics: &RealtimeMetrics) {
    metrics.presence_broadcasts.fetch_add(1, Ordering::Relaxed);
}
