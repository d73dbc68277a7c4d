//! Process-local user directory.

use async_trait::async_trait;
use dashmap::DashMap;

use parley_core::result::AppResult;
use parley_core::types::id::UserId;
use parley_entity::user::UserProfile;

use crate::repositories::UserDirectory;

/// In-memory [`UserDirectory`], seeded by whoever owns the user records.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    profiles: DashMap<UserId, UserProfile>,
}

impl MemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile.
    pub fn upsert(&self, profile: UserProfile) {
        self.profiles.insert(profile.id, profile);
    }

    /// Number of known users.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_profile(&self, user: UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.get(&user).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_and_find() {
        let directory = MemoryUserDirectory::new();
        let id = UserId::new();
        directory.upsert(UserProfile::new(id, "Ada"));
        directory.upsert(UserProfile::new(id, "Ada L."));

        let profile = directory.find_profile(id).await.unwrap().unwrap();
        assert_eq!(profile.name, "Ada L.");
        assert_eq!(directory.len(), 1);
        assert!(directory.find_profile(UserId::new()).await.unwrap().is_none());
    }
}
