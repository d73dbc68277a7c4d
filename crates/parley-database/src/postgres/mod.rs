//! PostgreSQL implementations (sqlx).

pub mod conversation;
pub mod user;

pub use conversation::PgConversationStore;
pub use user::PgUserDirectory;
