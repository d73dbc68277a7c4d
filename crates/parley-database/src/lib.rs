//! # parley-database
//!
//! Persistence for Parley. Defines the [`ConversationStore`] and
//! [`UserDirectory`] contracts the realtime engine depends on, and ships two
//! implementations of each: a process-local one backed by `DashMap` and a
//! PostgreSQL one backed by sqlx.

pub mod connection;
pub mod memory;
pub mod postgres;
pub mod repositories;

pub use connection::{DatabasePool, SchemaStatus};
pub use memory::{MemoryConversationStore, MemoryUserDirectory};
pub use postgres::{PgConversationStore, PgUserDirectory};
pub use repositories::{ConversationStore, UserDirectory};
