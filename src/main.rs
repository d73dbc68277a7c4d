//! Parley Server: real-time direct messaging.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use parley_api::{AppState, build_router};
use parley_auth::JwtIdentityResolver;
use parley_core::config::{AppConfig, DatabaseBackend, LoggingConfig};
use parley_core::error::{AppError, ErrorKind};
use parley_database::repositories::{ConversationStore, UserDirectory};
use parley_database::{DatabasePool, MemoryConversationStore, MemoryUserDirectory};
use parley_realtime::RealtimeEngine;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("PARLEY_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Storage collaborators for the selected backend.
struct Storage {
    store: Arc<dyn ConversationStore>,
    directory: Arc<dyn UserDirectory>,
    database: Option<DatabasePool>,
}

async fn open_storage(config: &AppConfig) -> Result<Storage, AppError> {
    match config.database.backend {
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory storage; conversations are lost on restart");
            Ok(Storage {
                store: Arc::new(MemoryConversationStore::new()),
                directory: Arc::new(MemoryUserDirectory::new()),
                database: None,
            })
        }
        DatabaseBackend::Postgres => {
            let pool = DatabasePool::connect(&config.database).await?;
            if config.database.run_migrations {
                pool.migrate().await?;
            }
            Ok(Storage {
                store: pool.conversation_store(),
                directory: pool.user_directory(),
                database: Some(pool),
            })
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.database.backend,
        "Starting Parley"
    );

    // ── Step 1: Storage ──────────────────────────────────────────
    let storage = open_storage(&config).await?;

    // ── Step 2: Realtime engine ──────────────────────────────────
    let identity = Arc::new(JwtIdentityResolver::new(&config.auth));
    let realtime = RealtimeEngine::new(
        config.realtime.clone(),
        identity,
        storage.store,
        storage.directory,
    );

    // ── Step 3: HTTP server ──────────────────────────────────────
    let app = build_router(AppState {
        config: Arc::new(config.clone()),
        realtime: realtime.clone(),
        database: storage.database.clone(),
    });

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e)
        })?;

    tracing::info!(addr = %addr, "Parley server listening");

    // ── Step 4: Graceful shutdown ────────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let engine = realtime.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, closing sessions");
            if let Err(e) = engine.shutdown().await {
                tracing::warn!(error = %e, "Realtime engine shutdown failed");
            }
            drain_sessions(&engine, grace).await;
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Server error", e))?;

    if let Some(pool) = storage.database {
        pool.close().await;
    }

    tracing::info!("Parley server shut down gracefully");
    Ok(())
}

/// Wait until every session has deregistered, or the grace period ends.
async fn drain_sessions(engine: &RealtimeEngine, grace: Duration) {
    let drained = tokio::time::timeout(grace, async {
        while engine.presence.connection_count() > 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    if drained.is_err() {
        tracing::warn!(
            remaining = engine.presence.connection_count(),
            "Grace period elapsed with sessions still open"
        );
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
