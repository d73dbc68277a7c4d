//! Derived conversation summary types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parley_core::types::id::{ConversationId, MessageId, UserId};
use parley_entity::message::Message;
use parley_entity::user::UserProfile;

/// One sidebar entry as seen by one participant. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// Conversation identifier.
    pub conversation_id: ConversationId,
    /// The other participant (the viewer themself for a self-conversation).
    pub peer_id: UserId,
    /// Peer display data, when the directory knows the peer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<PeerSummary>,
    /// Whether the peer is online right now.
    pub peer_online: bool,
    /// Preview of the newest message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<MessagePreview>,
    /// Messages from the peer the viewer has not seen.
    pub unseen_count: u64,
    /// Newest message time, or conversation creation time.
    pub last_activity_at: DateTime<Utc>,
}

/// Peer display data carried in a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSummary {
    /// Display name.
    pub name: String,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
}

impl From<UserProfile> for PeerSummary {
    fn from(profile: UserProfile) -> Self {
        Self {
            name: profile.name,
            profile_pic: profile.profile_pic,
        }
    }
}

/// Short form of a message for the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePreview {
    pub message_id: MessageId,
    pub sender_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub has_image: bool,
    pub has_video: bool,
    pub seen: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessagePreview {
    fn from(message: &Message) -> Self {
        Self {
            message_id: message.id,
            sender_id: message.sender_id,
            text: message.content.text.clone(),
            has_image: message.content.has_image(),
            has_video: message.content.has_video(),
            seen: message.seen,
            created_at: message.created_at,
        }
    }
}
