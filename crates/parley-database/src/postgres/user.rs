//! PostgreSQL user directory.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use parley_core::error::{AppError, ErrorKind};
use parley_core::result::AppResult;
use parley_core::types::id::UserId;
use parley_entity::user::UserProfile;

use crate::repositories::UserDirectory;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    profile_pic: Option<String>,
}

/// [`UserDirectory`] reading the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Create a new user directory.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_profile(&self, user: UserId) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, profile_pic FROM users WHERE id = $1",
        )
        .bind(user.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load user profile", e))?;

        Ok(row.map(|r| UserProfile {
            id: UserId::from_uuid(r.id),
            name: r.name,
            email: r.email,
            profile_pic: r.profile_pic,
        }))
    }
}
