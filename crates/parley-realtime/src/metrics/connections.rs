//! Connection metrics helpers.

use std::sync::atomic::Ordering;

use super::RealtimeMetrics;

/// Record an authenticated connection
pub fn record_open(metrics: &RealtimeMetrics) {
    metrics.connections_opened.fetch_add(1, Ordering::Relaxed);
}

/// Record a closed connection
pub fn record_close(metrics: &RealtimeMetrics) {
    metrics.connections_closed.fetch_add(1, Ordering::Relaxed);
}

/// Record a rejected credential
pub fn record_auth_failure(metrics: &RealtimeMetrics) {
    metrics.auth_failures.fetch_add(1, Ordering::Relaxed);
}
