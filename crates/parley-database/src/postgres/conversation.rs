//! PostgreSQL conversation store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use parley_core::error::{AppError, ErrorKind};
use parley_core::result::AppResult;
use parley_core::types::id::{ConversationId, MessageId, UserId};
use parley_entity::conversation::{Conversation, ParticipantPair};
use parley_entity::message::{Message, MessageContent, NewMessage};

use crate::repositories::ConversationStore;

/// Columns of a conversation plus its ordered message ids.
const CONVERSATION_SELECT: &str = "SELECT c.id, c.participant_low, c.participant_high, \
     c.created_at, c.updated_at, \
     COALESCE(array_agg(m.id ORDER BY m.seq) FILTER (WHERE m.id IS NOT NULL), '{}') AS message_ids \
     FROM conversations c LEFT JOIN messages m ON m.conversation_id = c.id";

#[derive(Debug, FromRow)]
struct ConversationRow {
    id: Uuid,
    participant_low: Uuid,
    participant_high: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    message_ids: Vec<Uuid>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Self {
            id: ConversationId::from_uuid(row.id),
            participants: ParticipantPair::new(
                UserId::from_uuid(row.participant_low),
                UserId::from_uuid(row.participant_high),
            ),
            message_ids: row.message_ids.into_iter().map(MessageId::from_uuid).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    seq: i64,
    sender_id: Uuid,
    text: Option<String>,
    image_url: Option<String>,
    video_url: Option<String>,
    seen: bool,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: MessageId::from_uuid(row.id),
            conversation_id: ConversationId::from_uuid(row.conversation_id),
            seq: u64::try_from(row.seq).unwrap_or_default(),
            sender_id: UserId::from_uuid(row.sender_id),
            content: MessageContent {
                text: row.text,
                image_url: row.image_url,
                video_url: row.video_url,
            },
            seen: row.seen,
            created_at: row.created_at,
        }
    }
}

/// [`ConversationStore`] backed by PostgreSQL.
///
/// Pair uniqueness is enforced by the `conversations_pair_unique`
/// constraint; appends serialize on a row lock of the conversation.
#[derive(Debug, Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    /// Create a new conversation store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_by_pair(&self, pair: ParticipantPair) -> AppResult<Option<Conversation>> {
        let sql = format!(
            "{CONVERSATION_SELECT} WHERE c.participant_low = $1 AND c.participant_high = $2 \
             GROUP BY c.id"
        );
        let row = sqlx::query_as::<_, ConversationRow>(&sql)
            .bind(pair.low().into_uuid())
            .bind(pair.high().into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load conversation", e)
            })?;
        Ok(row.map(Conversation::from))
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn find_or_create_conversation(&self, a: UserId, b: UserId) -> AppResult<Conversation> {
        let pair = ParticipantPair::new(a, b);

        if let Some(existing) = self.fetch_by_pair(pair).await? {
            return Ok(existing);
        }

        let inserted = sqlx::query(
            "INSERT INTO conversations (id, participant_low, participant_high) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (participant_low, participant_high) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(pair.low().into_uuid())
        .bind(pair.high().into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create conversation", e))?;

        if inserted.rows_affected() == 1 {
            debug!(low = %pair.low(), high = %pair.high(), "Conversation created");
        }

        self.fetch_by_pair(pair)
            .await?
            .ok_or_else(|| AppError::database("Conversation vanished after insert"))
    }

    async fn find_conversation(&self, a: UserId, b: UserId) -> AppResult<Option<Conversation>> {
        self.fetch_by_pair(ParticipantPair::new(a, b)).await
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        message: NewMessage,
    ) -> AppResult<Message> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM conversations WHERE id = $1 FOR UPDATE")
                .bind(conversation_id.into_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to lock conversation", e)
                })?;
        if locked.is_none() {
            return Err(AppError::not_found(format!(
                "Conversation {conversation_id} not found"
            )));
        }

        let (next_seq, last_at): (i64, Option<DateTime<Utc>>) = sqlx::query_as(
            "SELECT COALESCE(MAX(seq), 0) + 1, MAX(created_at) \
             FROM messages WHERE conversation_id = $1",
        )
        .bind(conversation_id.into_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read sequence", e))?;

        let now = Utc::now();
        let created_at = last_at.map(|last| last.max(now)).unwrap_or(now);

        let row = sqlx::query_as::<_, MessageRow>(
            "INSERT INTO messages \
             (id, conversation_id, seq, sender_id, text, image_url, video_url, seen, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, $8) \
             RETURNING id, conversation_id, seq, sender_id, text, image_url, video_url, seen, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id.into_uuid())
        .bind(next_seq)
        .bind(message.sender_id.into_uuid())
        .bind(message.content.text)
        .bind(message.content.image_url)
        .bind(message.content.video_url)
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert message", e))?;

        sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(conversation_id.into_uuid())
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to touch conversation", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit message", e)
        })?;

        Ok(row.into())
    }

    async fn get_messages(&self, conversation_id: ConversationId) -> AppResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, conversation_id, seq, sender_id, text, image_url, video_url, seen, created_at \
             FROM messages WHERE conversation_id = $1 ORDER BY seq ASC",
        )
        .bind(conversation_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list messages", e))?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn mark_seen(
        &self,
        conversation_id: ConversationId,
        authored_by: UserId,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET seen = TRUE \
             WHERE conversation_id = $1 AND sender_id = $2 AND seen = FALSE",
        )
        .bind(conversation_id.into_uuid())
        .bind(authored_by.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark messages seen", e))?;

        Ok(result.rows_affected())
    }

    async fn list_conversations_for(&self, user: UserId) -> AppResult<Vec<Conversation>> {
        let sql = format!(
            "{CONVERSATION_SELECT} WHERE c.participant_low = $1 OR c.participant_high = $1 \
             GROUP BY c.id ORDER BY c.updated_at DESC"
        );
        let rows = sqlx::query_as::<_, ConversationRow>(&sql)
            .bind(user.into_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list conversations", e)
            })?;

        Ok(rows.into_iter().map(Conversation::from).collect())
    }
}
