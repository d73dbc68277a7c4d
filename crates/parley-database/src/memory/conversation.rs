//! Process-local conversation store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::debug;

use parley_core::error::AppError;
use parley_core::result::AppResult;
use parley_core::types::id::{ConversationId, MessageId, UserId};
use parley_entity::conversation::{Conversation, ParticipantPair};
use parley_entity::message::{Message, NewMessage};

use crate::repositories::ConversationStore;

/// One conversation's append-only log, guarded by its own lock.
#[derive(Debug)]
struct ConversationLog {
    id: ConversationId,
    participants: ParticipantPair,
    created_at: DateTime<Utc>,
    messages: RwLock<Vec<Message>>,
}

impl ConversationLog {
    fn new(id: ConversationId, participants: ParticipantPair) -> Self {
        Self {
            id,
            participants,
            created_at: Utc::now(),
            messages: RwLock::new(Vec::new()),
        }
    }

    async fn snapshot(&self) -> Conversation {
        let messages = self.messages.read().await;
        Conversation {
            id: self.id,
            participants: self.participants,
            message_ids: messages.iter().map(|m| m.id).collect(),
            created_at: self.created_at,
            updated_at: messages
                .last()
                .map(|m| m.created_at)
                .unwrap_or(self.created_at),
        }
    }
}

/// In-memory [`ConversationStore`].
///
/// The pair index is a `DashMap` whose entry lock makes check-then-create
/// atomic per pair. Each conversation's messages sit behind a separate
/// `RwLock`, so appends to different conversations never contend.
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    /// Canonical pair → conversation.
    by_pair: DashMap<ParticipantPair, ConversationId>,
    /// Conversation → message log.
    logs: DashMap<ConversationId, Arc<ConversationLog>>,
    /// User → conversations they take part in.
    by_user: DashMap<UserId, Vec<ConversationId>>,
}

impl MemoryConversationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations held.
    pub fn conversation_count(&self) -> usize {
        self.logs.len()
    }

    fn log(&self, id: ConversationId) -> Option<Arc<ConversationLog>> {
        self.logs.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    fn index_user(&self, user: UserId, id: ConversationId) {
        self.by_user.entry(user).or_default().push(id);
    }

    fn pair_id(&self, pair: &ParticipantPair) -> Option<ConversationId> {
        self.by_pair.get(pair).map(|entry| *entry.value())
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn find_or_create_conversation(&self, a: UserId, b: UserId) -> AppResult<Conversation> {
        let pair = ParticipantPair::new(a, b);

        let id = match self.pair_id(&pair) {
            Some(id) => id,
            None => {
                // The shard lock is held for the whole closure; a racing
                // caller blocks here and then sees the winner's id.
                *self.by_pair.entry(pair).or_insert_with(|| {
                    let id = ConversationId::new();
                    self.logs
                        .insert(id, Arc::new(ConversationLog::new(id, pair)));
                    self.index_user(pair.low(), id);
                    if !pair.is_self_pair() {
                        self.index_user(pair.high(), id);
                    }
                    debug!(conversation_id = %id, "Conversation created");
                    id
                })
            }
        };

        let log = self
            .log(id)
            .ok_or_else(|| AppError::internal(format!("Conversation index out of sync: {id}")))?;
        Ok(log.snapshot().await)
    }

    async fn find_conversation(&self, a: UserId, b: UserId) -> AppResult<Option<Conversation>> {
        let Some(log) = self
            .pair_id(&ParticipantPair::new(a, b))
            .and_then(|id| self.log(id))
        else {
            return Ok(None);
        };
        Ok(Some(log.snapshot().await))
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        message: NewMessage,
    ) -> AppResult<Message> {
        let log = self.log(conversation_id).ok_or_else(|| {
            AppError::not_found(format!("Conversation {conversation_id} not found"))
        })?;

        let mut messages = log.messages.write().await;
        let now = Utc::now();
        let created_at = messages
            .last()
            .map(|last| last.created_at.max(now))
            .unwrap_or(now);

        let stored = Message {
            id: MessageId::new(),
            conversation_id,
            seq: messages.len() as u64 + 1,
            sender_id: message.sender_id,
            content: message.content,
            seen: false,
            created_at,
        };
        messages.push(stored.clone());

        Ok(stored)
    }

    async fn get_messages(&self, conversation_id: ConversationId) -> AppResult<Vec<Message>> {
        match self.log(conversation_id) {
            Some(log) => Ok(log.messages.read().await.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn mark_seen(
        &self,
        conversation_id: ConversationId,
        authored_by: UserId,
    ) -> AppResult<u64> {
        let Some(log) = self.log(conversation_id) else {
            return Ok(0);
        };

        let mut messages = log.messages.write().await;
        let mut changed = 0u64;
        for message in messages
            .iter_mut()
            .filter(|m| m.sender_id == authored_by && !m.seen)
        {
            message.seen = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn list_conversations_for(&self, user: UserId) -> AppResult<Vec<Conversation>> {
        let ids = self
            .by_user
            .get(&user)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        let mut conversations = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(log) = self.log(id) {
                conversations.push(log.snapshot().await);
            }
        }
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::error::ErrorKind;
    use parley_entity::message::MessageContent;

    fn text(sender: UserId, body: &str) -> NewMessage {
        NewMessage::new(sender, MessageContent::text(body))
    }

    #[tokio::test]
    async fn test_find_or_create_is_order_independent() {
        let store = MemoryConversationStore::new();
        let (a, b) = (UserId::new(), UserId::new());

        let first = store.find_or_create_conversation(a, b).await.unwrap();
        let second = store.find_or_create_conversation(b, a).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.conversation_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creation_yields_one_conversation() {
        let store = Arc::new(MemoryConversationStore::new());
        let (a, b) = (UserId::new(), UserId::new());

        let mut tasks = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            let (x, y) = if i % 2 == 0 { (a, b) } else { (b, a) };
            tasks.push(tokio::spawn(async move {
                store.find_or_create_conversation(x, y).await.unwrap().id
            }));
        }

        let ids = futures::future::join_all(tasks).await;
        let first = ids[0].as_ref().copied().unwrap();
        assert!(ids.iter().all(|id| *id.as_ref().unwrap() == first));
        assert_eq!(store.conversation_count(), 1);
        assert_eq!(store.list_conversations_for(a).await.unwrap().len(), 1);
        assert_eq!(store.list_conversations_for(b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_assigns_sequence_and_keeps_order() {
        let store = MemoryConversationStore::new();
        let (a, b) = (UserId::new(), UserId::new());
        let conv = store.find_or_create_conversation(a, b).await.unwrap();

        for body in ["one", "two", "three"] {
            store.append_message(conv.id, text(a, body)).await.unwrap();
        }

        let messages = store.get_messages(conv.id).await.unwrap();
        let bodies: Vec<_> = messages
            .iter()
            .map(|m| m.content.text.clone().unwrap())
            .collect();
        assert_eq!(bodies, ["one", "two", "three"]);
        assert_eq!(
            messages.iter().map(|m| m.seq).collect::<Vec<_>>(),
            [1, 2, 3]
        );
        assert!(messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));

        let refreshed = store.find_conversation(b, a).await.unwrap().unwrap();
        assert_eq!(refreshed.message_ids, messages.iter().map(|m| m.id).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_appends_to_other_conversations_do_not_interleave() {
        let store = Arc::new(MemoryConversationStore::new());
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
        let ab = store.find_or_create_conversation(a, b).await.unwrap().id;
        let ac = store.find_or_create_conversation(a, c).await.unwrap().id;

        let noise = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for i in 0..100 {
                    store.append_message(ac, text(c, &i.to_string())).await.unwrap();
                }
            })
        };
        for i in 0..100 {
            store.append_message(ab, text(a, &i.to_string())).await.unwrap();
        }
        noise.await.unwrap();

        let messages = store.get_messages(ab).await.unwrap();
        assert_eq!(messages.len(), 100);
        for (i, message) in messages.iter().enumerate() {
            assert_eq!(message.content.text.as_deref(), Some(i.to_string().as_str()));
            assert_eq!(message.conversation_id, ab);
        }
    }

    #[tokio::test]
    async fn test_append_to_unknown_conversation_fails() {
        let store = MemoryConversationStore::new();
        let err = store
            .append_message(ConversationId::new(), text(UserId::new(), "hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_mark_seen_is_idempotent_and_scoped_to_author() {
        let store = MemoryConversationStore::new();
        let (a, b) = (UserId::new(), UserId::new());
        let conv = store.find_or_create_conversation(a, b).await.unwrap();
        store.append_message(conv.id, text(a, "from a")).await.unwrap();
        store.append_message(conv.id, text(a, "again")).await.unwrap();
        store.append_message(conv.id, text(b, "from b")).await.unwrap();

        assert_eq!(store.mark_seen(conv.id, a).await.unwrap(), 2);
        assert_eq!(store.mark_seen(conv.id, a).await.unwrap(), 0);

        let messages = store.get_messages(conv.id).await.unwrap();
        assert!(messages.iter().filter(|m| m.sender_id == a).all(|m| m.seen));
        assert!(messages.iter().filter(|m| m.sender_id == b).all(|m| !m.seen));
    }

    #[tokio::test]
    async fn test_unknown_reads_are_empty() {
        let store = MemoryConversationStore::new();
        let user = UserId::new();
        assert!(store.get_messages(ConversationId::new()).await.unwrap().is_empty());
        assert!(store.list_conversations_for(user).await.unwrap().is_empty());
        assert!(store.find_conversation(user, UserId::new()).await.unwrap().is_none());
        assert_eq!(store.mark_seen(ConversationId::new(), user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_self_conversation_is_listed_once() {
        let store = MemoryConversationStore::new();
        let a = UserId::new();
        let conv = store.find_or_create_conversation(a, a).await.unwrap();
        assert!(conv.participants.is_self_pair());
        assert_eq!(store.list_conversations_for(a).await.unwrap().len(), 1);
    }
}
