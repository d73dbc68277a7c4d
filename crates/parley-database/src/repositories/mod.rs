//! Repository contracts consumed by the realtime engine.

pub mod conversation;
pub mod user;

pub use conversation::ConversationStore;
pub use user::UserDirectory;
