//! Message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parley_core::types::id::{ConversationId, MessageId, UserId};

use super::content::MessageContent;

/// A stored chat message.
///
/// `seq` and `created_at` are assigned by the store at append time and
/// never decrease within a conversation. `seen` only ever moves from
/// `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Conversation the message belongs to.
    pub conversation_id: ConversationId,
    /// 1-based position within the conversation.
    pub seq: u64,
    /// Author of the message.
    pub sender_id: UserId,
    /// Text and media references.
    #[serde(flatten)]
    pub content: MessageContent,
    /// Whether the non-author participant has seen the message.
    pub seen: bool,
    /// When the message was appended.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether `user` wrote this message.
    pub fn is_authored_by(&self, user: UserId) -> bool {
        self.sender_id == user
    }
}

/// A message about to be appended; the store fills in the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Author of the message.
    pub sender_id: UserId,
    /// Text and media references.
    pub content: MessageContent,
}

impl NewMessage {
    /// Create a new message draft.
    pub fn new(sender_id: UserId, content: MessageContent) -> Self {
        Self { sender_id, content }
    }
}
