//! Canonical unordered participant pair.

use serde::{Deserialize, Serialize};

use parley_core::types::id::UserId;

/// The unordered pair of users a conversation belongs to.
///
/// Always stored sorted (`low <= high`), so `(a, b)` and `(b, a)` produce
/// the same key. A pair with equal members is a self-conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantPair {
    low: UserId,
    high: UserId,
}

impl ParticipantPair {
    /// Canonicalize two user ids into a pair.
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// The smaller identity.
    pub fn low(&self) -> UserId {
        self.low
    }

    /// The larger identity.
    pub fn high(&self) -> UserId {
        self.high
    }

    /// Whether `user` is one of the two participants.
    pub fn contains(&self, user: UserId) -> bool {
        self.low == user || self.high == user
    }

    /// The participant that is not `user`.
    ///
    /// For a self-conversation the peer is the user itself. Returns `None`
    /// if `user` is not a participant.
    pub fn peer_of(&self, user: UserId) -> Option<UserId> {
        if self.low == user {
            Some(self.high)
        } else if self.high == user {
            Some(self.low)
        } else {
            None
        }
    }

    /// Whether both members are the same user.
    pub fn is_self_pair(&self) -> bool {
        self.low == self.high
    }
}
