//! Health check handler.

use axum::Json;
use axum::extract::State;

use parley_database::SchemaStatus;

use crate::dto::HealthResponse;
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match &state.database {
        None => "memory",
        Some(pool) => match pool.schema_status().await {
            Ok(SchemaStatus::Ready) => "connected",
            Ok(SchemaStatus::Incomplete(_)) => "schema-missing",
            Err(_) => "unavailable",
        },
    };
    let status = if matches!(database, "memory" | "connected") {
        "ok"
    } else {
        "degraded"
    };

    let presence = &state.realtime.presence;
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        connections: presence.connection_count(),
        online_users: presence.online_count(),
        metrics: state.realtime.metrics_snapshot(),
    })
}
