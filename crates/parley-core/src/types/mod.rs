//! Shared value types.

pub mod id;

pub use id::{ConnectionId, ConversationId, MessageId, UserId};
