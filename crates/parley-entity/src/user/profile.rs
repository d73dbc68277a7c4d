//! Public user profile.

use serde::{Deserialize, Serialize};

use parley_core::types::id::UserId;

/// Display data for a user, as known to the user directory.
///
/// Registration and profile editing live outside the messaging core; this
/// is a read-only view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
}

impl UserProfile {
    /// Create a profile with just a display name.
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
            profile_pic: None,
        }
    }
}
