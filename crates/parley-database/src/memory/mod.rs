//! Process-local implementations, used by default and in tests.

pub mod conversation;
pub mod user;

pub use conversation::MemoryConversationStore;
pub use user::MemoryUserDirectory;
