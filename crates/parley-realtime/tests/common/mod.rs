//! Shared fixtures for realtime integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use parley_core::config::RealtimeConfig;
use parley_core::error::AppError;
use parley_core::result::AppResult;
use parley_core::traits::IdentityResolver;
use parley_core::types::id::{ConversationId, UserId};
use parley_database::memory::{MemoryConversationStore, MemoryUserDirectory};
use parley_database::repositories::ConversationStore;
use parley_entity::conversation::Conversation;
use parley_entity::message::{Message, NewMessage};
use parley_realtime::ConnectionHandle;
use parley_realtime::RealtimeEngine;
use parley_realtime::message::types::{InboundEvent, OutboundEvent};
use parley_realtime::router::Session;

/// Accepts any credential that is a user UUID.
#[derive(Debug)]
pub struct UuidIdentity;

#[async_trait]
impl IdentityResolver for UuidIdentity {
    async fn resolve(&self, credential: &str) -> AppResult<UserId> {
        credential
            .parse()
            .map_err(|_| AppError::authentication("Invalid authentication token"))
    }
}

/// Memory store whose appends, message reads, or listings for chosen users
/// can be made to fail with a database error.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryConversationStore,
    fail_appends: AtomicBool,
    fail_reads: AtomicBool,
    fail_listing: Mutex<HashSet<UserId>>,
}

impl FaultyStore {
    pub fn conversation_count(&self) -> usize {
        self.inner.conversation_count()
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_listing_for(&self, user: UserId) {
        self.fail_listing.lock().unwrap().insert(user);
    }
}

#[async_trait]
impl ConversationStore for FaultyStore {
    async fn find_or_create_conversation(&self, a: UserId, b: UserId) -> AppResult<Conversation> {
        self.inner.find_or_create_conversation(a, b).await
    }

    async fn find_conversation(&self, a: UserId, b: UserId) -> AppResult<Option<Conversation>> {
        self.inner.find_conversation(a, b).await
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        message: NewMessage,
    ) -> AppResult<Message> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(AppError::database("connection reset while inserting into messages"));
        }
        self.inner.append_message(conversation_id, message).await
    }

    async fn get_messages(&self, conversation_id: ConversationId) -> AppResult<Vec<Message>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::database("could not read from relation \"messages\""));
        }
        self.inner.get_messages(conversation_id).await
    }

    async fn mark_seen(
        &self,
        conversation_id: ConversationId,
        authored_by: UserId,
    ) -> AppResult<u64> {
        self.inner.mark_seen(conversation_id, authored_by).await
    }

    async fn list_conversations_for(&self, user: UserId) -> AppResult<Vec<Conversation>> {
        if self.fail_listing.lock().unwrap().contains(&user) {
            return Err(AppError::database("statement timeout on conversations"));
        }
        self.inner.list_conversations_for(user).await
    }
}

pub struct Harness {
    pub store: Arc<FaultyStore>,
    pub directory: Arc<MemoryUserDirectory>,
    pub engine: RealtimeEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(RealtimeConfig::default())
    }

    pub fn with_config(config: RealtimeConfig) -> Self {
        let store = Arc::new(FaultyStore::default());
        let directory = Arc::new(MemoryUserDirectory::new());
        let engine = RealtimeEngine::new(
            config,
            Arc::new(UuidIdentity),
            store.clone(),
            directory.clone(),
        );
        Self {
            store,
            directory,
            engine,
        }
    }

    /// Authenticate a new connection for `user` through the router.
    pub async fn connect(&self, user: UserId) -> Client {
        let (tx, rx) = mpsc::channel(64);
        let mut session = Session::new();
        let handle = self
            .engine
            .router
            .connect(&mut session, Some(&user.to_string()), tx)
            .await
            .expect("connect");
        Client {
            session,
            handle,
            rx,
        }
    }

    pub async fn dispatch(&self, client: &mut Client, event: InboundEvent) {
        self.engine.router.dispatch(&mut client.session, event).await;
    }

    pub fn disconnect(&self, client: &mut Client) {
        self.engine.router.disconnect(&mut client.session);
    }
}

pub struct Client {
    pub session: Session,
    pub handle: Arc<ConnectionHandle>,
    pub rx: mpsc::Receiver<OutboundEvent>,
}

impl Client {
    pub fn user_id(&self) -> UserId {
        self.handle.user_id
    }

    /// Everything queued so far.
    pub fn drain(&mut self) -> Vec<OutboundEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
