//! # parley-api
//!
//! HTTP layer for Parley built on Axum.
//!
//! Exposes the WebSocket upgrade that feeds the realtime engine, a health
//! endpoint, CORS and request tracing, and the `AppError` → HTTP mapping.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
