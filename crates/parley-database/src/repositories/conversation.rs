//! Conversation repository contract.

use async_trait::async_trait;

use parley_core::result::AppResult;
use parley_core::types::id::{ConversationId, UserId};
use parley_entity::conversation::Conversation;
use parley_entity::message::{Message, NewMessage};

/// Durable store of two-party conversations and their ordered messages.
///
/// Implementations must be safe to share between connection tasks:
///
/// - at most one conversation exists per unordered pair of users, even when
///   both users race to create it;
/// - `append_message` is the single ordering authority: it assigns `seq`
///   and `created_at` so that both are non-decreasing per conversation;
/// - reads on unknown identifiers return empty results rather than errors.
#[async_trait]
pub trait ConversationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the conversation between `a` and `b`, creating it if absent.
    /// Argument order does not matter.
    async fn find_or_create_conversation(&self, a: UserId, b: UserId) -> AppResult<Conversation>;

    /// Return the conversation between `a` and `b` if it exists.
    async fn find_conversation(&self, a: UserId, b: UserId) -> AppResult<Option<Conversation>>;

    /// Append a message and return it with its assigned id, `seq` and
    /// timestamp. Fails with `NotFound` for an unknown conversation.
    async fn append_message(
        &self,
        conversation_id: ConversationId,
        message: NewMessage,
    ) -> AppResult<Message>;

    /// All messages of a conversation, oldest first.
    async fn get_messages(&self, conversation_id: ConversationId) -> AppResult<Vec<Message>>;

    /// Mark every unseen message written by `authored_by` as seen and
    /// return how many changed.
    async fn mark_seen(&self, conversation_id: ConversationId, authored_by: UserId)
    -> AppResult<u64>;

    /// Every conversation `user` participates in, most recently updated first.
    async fn list_conversations_for(&self, user: UserId) -> AppResult<Vec<Conversation>>;
}
