//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use parley_core::config::AppConfig;
use parley_database::DatabasePool;
use parley_realtime::RealtimeEngine;

/// Shared application state passed to every Axum handler via `State`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Realtime engine.
    pub realtime: RealtimeEngine,
    /// PostgreSQL pool, when that backend is selected.
    pub database: Option<DatabasePool>,
}
