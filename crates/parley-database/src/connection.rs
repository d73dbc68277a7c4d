//! PostgreSQL pool, schema migrations and schema probing.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use parley_core::config::DatabaseConfig;
use parley_core::error::{AppError, ErrorKind};
use parley_core::result::AppResult;

use crate::postgres::{PgConversationStore, PgUserDirectory};

/// Tables the PostgreSQL stores read and write.
const MESSAGING_TABLES: [&str; 3] = ["users", "conversations", "messages"];

/// Result of probing the messaging schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// Every messaging table is present.
    Ready,
    /// The database answers but these tables are missing.
    Incomplete(Vec<&'static str>),
}

/// Shared pool from which the PostgreSQL stores are built.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool described by `config`.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        info!(
            url = %redact_credentials(&config.url),
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Opening PostgreSQL pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to open PostgreSQL pool", e)
            })?;

        Ok(Self { pool })
    }

    /// Apply the embedded migrations from the workspace `migrations/` directory.
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to apply messaging schema", e)
            })?;
        info!("Messaging schema is up to date");
        Ok(())
    }

    /// Conversation store sharing this pool.
    pub fn conversation_store(&self) -> Arc<PgConversationStore> {
        Arc::new(PgConversationStore::new(self.pool.clone()))
    }

    /// User directory sharing this pool.
    pub fn user_directory(&self) -> Arc<PgUserDirectory> {
        Arc::new(PgUserDirectory::new(self.pool.clone()))
    }

    /// Check that the database answers and that the messaging tables exist.
    pub async fn schema_status(&self) -> AppResult<SchemaStatus> {
        let present: Vec<String> = sqlx::query_scalar(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = ANY($1)",
        )
        .bind(MESSAGING_TABLES.map(String::from).to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Schema probe failed", e))?;

        let missing = missing_tables(&present);
        if missing.is_empty() {
            Ok(SchemaStatus::Ready)
        } else {
            warn!(missing = ?missing, "Messaging tables are missing");
            Ok(SchemaStatus::Incomplete(missing))
        }
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}

fn missing_tables(present: &[String]) -> Vec<&'static str> {
    MESSAGING_TABLES
        .into_iter()
        .filter(|table| !present.iter().any(|p| p == table))
        .collect()
}

/// Drop the user-info part of a connection URL before it is logged.
fn redact_credentials(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme + 3 => {
            format!("{}****@{}", &url[..scheme + 3], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
