//! Builder helpers for constructing outbound events.

use chrono::Utc;

use parley_core::error::AppError;
use parley_core::types::id::{ConversationId, UserId};
use parley_entity::conversation::ParticipantPair;
use parley_entity::message::Message;
use parley_entity::user::UserProfile;

use super::types::{MessageList, OutboundEvent, PeerProfile};

/// Build a `peer-profile` event. A missing profile yields id and online flag only.
pub fn build_peer_profile(peer_id: UserId, profile: Option<UserProfile>, online: bool) -> OutboundEvent {
    let profile = match profile {
        Some(profile) => PeerProfile {
            id: peer_id,
            name: Some(profile.name),
            email: profile.email,
            profile_pic: profile.profile_pic,
            online,
        },
        None => PeerProfile {
            id: peer_id,
            name: None,
            email: None,
            profile_pic: None,
            online,
        },
    };
    OutboundEvent::PeerProfile(profile)
}

/// Build a `message-list` event
pub fn build_message_list(
    conversation_id: ConversationId,
    participants: ParticipantPair,
    messages: Vec<Message>,
) -> OutboundEvent {
    OutboundEvent::MessageList(MessageList {
        conversation_id,
        participants: [participants.low(), participants.high()],
        messages,
    })
}

/// Build an `online-users` snapshot
pub fn build_online_users(users: Vec<UserId>, revision: u64) -> OutboundEvent {
    OutboundEvent::OnlineUsers { users, revision }
}

/// Build an `operation-failed` event carrying only the client-safe reason
pub fn build_operation_failed(operation: &str, err: &AppError) -> OutboundEvent {
    OutboundEvent::OperationFailed {
        operation: operation.to_string(),
        reason: err.public_message(),
    }
}

/// Build an `auth-error` event
pub fn build_auth_error(err: &AppError) -> OutboundEvent {
    OutboundEvent::AuthError {
        message: err.public_message(),
    }
}

/// Build a heartbeat `ping` stamped with the current time
pub fn build_ping() -> OutboundEvent {
    OutboundEvent::Ping {
        timestamp: Utc::now().timestamp_millis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_peer_profile_has_only_id_and_online() {
        let peer = UserId::new();
        let OutboundEvent::PeerProfile(profile) = build_peer_profile(peer, None, true) else {
            panic!("expected peer-profile");
        };
        assert_eq!(profile.id, peer);
        assert!(profile.online);
        assert!(profile.name.is_none());
        assert_eq!(
            serde_json::to_value(&profile).unwrap(),
            serde_json::json!({ "id": peer, "online": true })
        );
    }

    #[test]
    fn test_operation_failed_hides_internal_detail() {
        let err = AppError::database("connection reset by peer at 10.0.0.3");
        let OutboundEvent::OperationFailed { operation, reason } =
            build_operation_failed("send", &err)
        else {
            panic!("expected operation-failed");
        };
        assert_eq!(operation, "send");
        assert_eq!(reason, "An internal error occurred");
    }

    #[test]
    fn test_message_list_participants_are_sorted() {
        let (a, b) = (UserId::new(), UserId::new());
        let pair = ParticipantPair::new(a, b);
        let OutboundEvent::MessageList(list) =
            build_message_list(ConversationId::new(), pair, Vec::new())
        else {
            panic!("expected message-list");
        };
        assert!(list.participants[0] <= list.participants[1]);
    }
}
