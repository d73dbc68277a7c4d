//! # parley-realtime
//!
//! Real-time messaging engine for Parley. Provides:
//!
//! - Presence tracking with multi-device fan-out
//! - The per-connection event state machine (history, send, sidebar, seen)
//! - Per-user conversation summaries for the sidebar
//! - A transport-agnostic session driver with ping/pong heartbeat
//! - Engine-level counters

pub mod aggregator;
pub mod connection;
pub mod gateway;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod router;
pub mod server;

pub use aggregator::ConversationAggregator;
pub use connection::handle::ConnectionHandle;
pub use gateway::ConnectionGateway;
pub use metrics::RealtimeMetrics;
pub use presence::registry::PresenceRegistry;
pub use router::MessageRouter;
pub use server::RealtimeEngine;
