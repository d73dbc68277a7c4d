//! Inbound and outbound event type definitions.
//!
//! Every frame is a JSON object tagged as `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};

use parley_core::types::id::{ConversationId, UserId};
use parley_entity::message::{Message, MessageContent};

use crate::aggregator::summary::ConversationSummary;

/// Events sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum InboundEvent {
    /// Open the conversation with a peer.
    History(UserId),
    /// Send a message to a peer.
    Send(SendMessage),
    /// Request the caller's conversation list.
    Sidebar,
    /// Mark everything the peer wrote as seen.
    Seen(UserId),
    /// Close this connection.
    Disconnect,
    /// Answer to a server ping.
    Pong {
        /// Echoed ping timestamp.
        #[serde(default)]
        timestamp: i64,
    },
}

impl InboundEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::History(_) => "history",
            Self::Send(_) => "send",
            Self::Sidebar => "sidebar",
            Self::Seen(_) => "seen",
            Self::Disconnect => "disconnect",
            Self::Pong { .. } => "pong",
        }
    }
}

/// Payload of the `send` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    /// Recipient.
    pub peer_id: UserId,
    /// Text and media references.
    #[serde(flatten)]
    pub content: MessageContent,
}

/// Events sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundEvent {
    /// Profile of the peer whose conversation was opened.
    PeerProfile(PeerProfile),
    /// Full ordered history of one conversation.
    MessageList(MessageList),
    /// The recipient's conversation summaries, most recent first.
    Sidebar(Vec<ConversationSummary>),
    /// Everyone currently online.
    OnlineUsers {
        /// Sorted online user ids.
        users: Vec<UserId>,
        /// Increases with every broadcast; older snapshots can be discarded.
        revision: u64,
    },
    /// A handler failed; the connection stays open.
    OperationFailed {
        /// Name of the inbound event that failed.
        operation: String,
        /// Client-safe reason.
        reason: String,
    },
    /// Credential rejected; the connection is about to close.
    AuthError {
        /// Client-safe reason.
        message: String,
    },
    /// Heartbeat probe; answer with `pong`.
    Ping {
        /// Server time in milliseconds since the epoch.
        timestamp: i64,
    },
}

impl OutboundEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PeerProfile(_) => "peer-profile",
            Self::MessageList(_) => "message-list",
            Self::Sidebar(_) => "sidebar",
            Self::OnlineUsers { .. } => "online-users",
            Self::OperationFailed { .. } => "operation-failed",
            Self::AuthError { .. } => "auth-error",
            Self::Ping { .. } => "ping",
        }
    }
}

/// Peer data shown when a conversation is opened.
///
/// Only `id` and `online` are guaranteed; the rest is absent when the
/// directory has no profile for the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerProfile {
    /// Peer identifier.
    pub id: UserId,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    /// Whether the peer has at least one live connection.
    pub online: bool,
}

/// Payload of the `message-list` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageList {
    /// Conversation the messages belong to.
    pub conversation_id: ConversationId,
    /// Both participants, sorted; a self-conversation lists one id twice.
    pub participants: [UserId; 2],
    /// Messages ordered by `seq`.
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inbound_events_decode_from_tagged_frames() {
        let peer = UserId::new();

        let history: InboundEvent =
            serde_json::from_value(json!({ "event": "history", "data": peer })).unwrap();
        assert_eq!(history, InboundEvent::History(peer));

        let sidebar: InboundEvent = serde_json::from_value(json!({ "event": "sidebar" })).unwrap();
        assert_eq!(sidebar, InboundEvent::Sidebar);

        let pong: InboundEvent =
            serde_json::from_value(json!({ "event": "pong", "data": { "timestamp": 42 } })).unwrap();
        assert_eq!(pong, InboundEvent::Pong { timestamp: 42 });
    }

    #[test]
    fn test_send_payload_flattens_content() {
        let peer = UserId::new();
        let event: InboundEvent = serde_json::from_value(json!({
            "event": "send",
            "data": { "peerId": peer, "text": "hi", "imageUrl": "https://cdn.example/a.png" }
        }))
        .unwrap();

        let InboundEvent::Send(payload) = event else {
            panic!("expected send");
        };
        assert_eq!(payload.peer_id, peer);
        assert_eq!(payload.content.text.as_deref(), Some("hi"));
        assert_eq!(
            payload.content.image_url.as_deref(),
            Some("https://cdn.example/a.png")
        );
        assert!(payload.content.video_url.is_none());
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result = serde_json::from_value::<InboundEvent>(json!({ "event": "typing" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_outbound_events_use_kebab_case_tags() {
        let event = OutboundEvent::OperationFailed {
            operation: "send".to_string(),
            reason: "Message is empty".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "operation-failed",
                "data": { "operation": "send", "reason": "Message is empty" }
            })
        );
        assert_eq!(event.name(), "operation-failed");

        let users = vec![UserId::new()];
        let event = OutboundEvent::OnlineUsers {
            users: users.clone(),
            revision: 3,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "event": "online-users", "data": { "users": users, "revision": 3 } })
        );
    }
}
