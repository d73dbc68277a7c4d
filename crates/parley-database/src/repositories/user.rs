//! User directory contract.

use async_trait::async_trait;

use parley_core::result::AppResult;
use parley_core::types::id::UserId;
use parley_entity::user::UserProfile;

/// Read-only lookup of user display data.
#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Profile of `user`, or `None` if the directory does not know them.
    async fn find_profile(&self, user: UserId) -> AppResult<Option<UserProfile>>;
}
