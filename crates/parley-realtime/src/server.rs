//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use parley_core::config::RealtimeConfig;
use parley_core::error::AppError;
use parley_core::traits::IdentityResolver;
use parley_database::repositories::{ConversationStore, UserDirectory};

use crate::gateway::ConnectionGateway;
use crate::metrics::{MetricsSnapshot, RealtimeMetrics};
use crate::presence::registry::PresenceRegistry;
use crate::router::MessageRouter;

/// Central real-time engine: presence, routing and the session driver.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Presence registry.
    pub presence: Arc<PresenceRegistry>,
    /// Event router.
    pub router: Arc<MessageRouter>,
    /// Session driver handed each transport connection.
    pub gateway: ConnectionGateway,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("online_users", &self.presence.online_count())
            .field("connections", &self.presence.connection_count())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine over the given collaborators.
    pub fn new(
        config: RealtimeConfig,
        identity: Arc<dyn IdentityResolver>,
        store: Arc<dyn ConversationStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(RealtimeMetrics::new());
        let presence = Arc::new(PresenceRegistry::new(Arc::clone(&metrics)));
        let router = Arc::new(MessageRouter::new(
            config.clone(),
            identity,
            store,
            directory,
            Arc::clone(&presence),
            Arc::clone(&metrics),
        ));
        let gateway = ConnectionGateway::new(Arc::clone(&router), config, shutdown_tx.clone());

        info!("Real-time engine initialized");

        Self {
            presence,
            router,
            gateway,
            metrics,
            shutdown_tx,
        }
    }

    /// Current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        info!(
            connections = self.presence.connection_count(),
            "Shutting down real-time engine"
        );

        // No receivers just means no live sessions.
        let _ = self.shutdown_tx.send(());
        self.presence.close_all();

        info!("Real-time engine shut down");
        Ok(())
    }
}
