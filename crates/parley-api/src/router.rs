//! Route definitions for the Parley HTTP API.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::cors::build_cors_layer;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    let api_routes = Router::new().route("/health", get(handlers::health::health));

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_upgrade))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use parley_core::config::AppConfig;
    use parley_core::error::AppError;
    use parley_core::result::AppResult;
    use parley_core::traits::IdentityResolver;
    use parley_core::types::id::UserId;
    use parley_database::{MemoryConversationStore, MemoryUserDirectory};
    use parley_realtime::RealtimeEngine;

    use super::*;

    #[derive(Debug)]
    struct RejectAll;

    #[async_trait]
    impl IdentityResolver for RejectAll {
        async fn resolve(&self, _credential: &str) -> AppResult<UserId> {
            Err(AppError::authentication("Invalid authentication token"))
        }
    }

    fn app() -> Router {
        let config = AppConfig::default();
        let realtime = RealtimeEngine::new(
            config.realtime.clone(),
            Arc::new(RejectAll),
            Arc::new(MemoryConversationStore::new()),
            Arc::new(MemoryUserDirectory::new()),
        );
        build_router(AppState {
            config: Arc::new(config),
            realtime,
            database: None,
        })
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_engine_state() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "memory");
        assert_eq!(body["connections"], 0);
        assert_eq!(body["onlineUsers"], 0);
        assert_eq!(body["metrics"]["authFailures"], 0);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let response = app()
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_ws_requires_upgrade() {
        let response = app()
            .oneshot(Request::get("/ws?token=abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
