//! Conversation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parley_core::types::id::{ConversationId, MessageId, UserId};

use super::pair::ParticipantPair;

/// A durable two-party message thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: ConversationId,
    /// The canonical participant pair.
    pub participants: ParticipantPair,
    /// Message references in append order.
    pub message_ids: Vec<MessageId>,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
    /// When a message was last appended (or creation time).
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation between two users.
    pub fn new(a: UserId, b: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            participants: ParticipantPair::new(a, b),
            message_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The counterpart of `user` in this conversation.
    pub fn peer_of(&self, user: UserId) -> Option<UserId> {
        self.participants.peer_of(user)
    }

    /// Number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.message_ids.len()
    }
}
