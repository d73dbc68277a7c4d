//! Response DTOs.

use serde::{Deserialize, Serialize};

use parley_realtime::metrics::MetricsSnapshot;

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database does not answer or lacks
    /// the messaging tables.
    pub status: String,
    /// Server version.
    pub version: String,
    /// `memory`, `connected`, `schema-missing` or `unavailable`.
    pub database: String,
    /// Live connections.
    pub connections: usize,
    /// Users with at least one live connection.
    pub online_users: usize,
    /// Engine counters.
    pub metrics: MetricsSnapshot,
}
