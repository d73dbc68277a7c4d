//! Inbound event handlers and fan-out.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use parley_core::config::RealtimeConfig;
use parley_core::error::AppError;
use parley_core::result::AppResult;
use parley_core::traits::IdentityResolver;
use parley_core::types::id::UserId;
use parley_database::repositories::{ConversationStore, UserDirectory};
use parley_entity::message::NewMessage;

use super::session::{Session, SessionState};
use crate::aggregator::ConversationAggregator;
use crate::connection::handle::ConnectionHandle;
use crate::message::builder;
use crate::message::types::{InboundEvent, OutboundEvent, SendMessage};
use crate::message::validator;
use crate::metrics::{RealtimeMetrics, connections, events};
use crate::presence::registry::{PresenceRegistry, PresenceTransition};

/// Drives sessions through `Unauthenticated → Authenticated → Closed` and
/// turns inbound events into store calls and outbound events.
///
/// Handler failures never end a session: they are reported to the caller
/// as `operation-failed` and nobody else hears about them.
#[derive(Debug)]
pub struct MessageRouter {
    identity: Arc<dyn IdentityResolver>,
    store: Arc<dyn ConversationStore>,
    directory: Arc<dyn UserDirectory>,
    presence: Arc<PresenceRegistry>,
    aggregator: ConversationAggregator,
    metrics: Arc<RealtimeMetrics>,
    config: RealtimeConfig,
}

impl MessageRouter {
    /// Create a new router
    pub fn new(
        config: RealtimeConfig,
        identity: Arc<dyn IdentityResolver>,
        store: Arc<dyn ConversationStore>,
        directory: Arc<dyn UserDirectory>,
        presence: Arc<PresenceRegistry>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        let aggregator = ConversationAggregator::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&presence),
        );
        Self {
            identity,
            store,
            directory,
            presence,
            aggregator,
            metrics,
            config,
        }
    }

    /// Presence registry shared with this router
    pub fn presence(&self) -> &Arc<PresenceRegistry> {
        &self.presence
    }

    /// Authenticate a fresh session and register it for presence.
    ///
    /// On failure the session is closed, an `auth-error` is queued on
    /// `sender`, and nothing is registered.
    pub async fn connect(
        &self,
        session: &mut Session,
        credential: Option<&str>,
        sender: mpsc::Sender<OutboundEvent>,
    ) -> AppResult<Arc<ConnectionHandle>> {
        if !matches!(session.state, SessionState::Unauthenticated) {
            return Err(AppError::conflict("Session is already past authentication"));
        }

        let resolved = match credential.map(str::trim).filter(|c| !c.is_empty()) {
            Some(credential) => self.identity.resolve(credential).await,
            None => Err(AppError::authentication("Authentication token is required")),
        };

        let user_id = match resolved {
            Ok(user_id) => user_id,
            Err(err) => {
                session.state = SessionState::Closed;
                connections::record_auth_failure(&self.metrics);
                if err.kind.is_internal() {
                    error!(error = %err, "Identity resolution failed");
                } else {
                    warn!(reason = %err.message, "Connection rejected");
                }
                // Ignore a full or closed channel; the transport is going away.
                let _ = sender.try_send(builder::build_auth_error(&err));
                return Err(err);
            }
        };

        let handle = Arc::new(ConnectionHandle::new(user_id, sender));
        session.state = SessionState::Authenticated(Arc::clone(&handle));
        connections::record_open(&self.metrics);

        info!(conn_id = %handle.id, user_id = %user_id, "Connection authenticated");

        // A transition already broadcast the snapshot to everyone including
        // this handle; an additional device only needs its own copy.
        if self.presence.register(Arc::clone(&handle)) == PresenceTransition::Unchanged {
            self.deliver(&handle, self.presence.snapshot());
        }

        Ok(handle)
    }

    /// Handle one inbound event. Events on a session that is not
    /// authenticated, or whose connection already closed, are dropped.
    pub async fn dispatch(&self, session: &mut Session, event: InboundEvent) {
        let handle = match &session.state {
            SessionState::Authenticated(handle) if handle.is_alive() => Arc::clone(handle),
            _ => {
                debug!(event = event.name(), "Dropping event for inactive session");
                return;
            }
        };

        events::record_received(&self.metrics);
        handle.touch();

        let operation = event.name();
        let result = match event {
            InboundEvent::History(peer_id) => self.handle_history(&handle, peer_id).await,
            InboundEvent::Send(payload) => self.handle_send(&handle, payload).await,
            InboundEvent::Sidebar => self.handle_sidebar(&handle).await,
            InboundEvent::Seen(peer_id) => self.handle_seen(&handle, peer_id).await,
            InboundEvent::Pong { .. } => Ok(()),
            InboundEvent::Disconnect => {
                self.disconnect(session);
                Ok(())
            }
        };

        if let Err(err) = result {
            self.report_failure(&handle, operation, &err);
        }
    }

    /// Close the session and release its presence entry. Idempotent.
    pub fn disconnect(&self, session: &mut Session) {
        match std::mem::replace(&mut session.state, SessionState::Closed) {
            SessionState::Authenticated(handle) => {
                handle.close();
                self.presence.deregister(handle.user_id, handle.id);
                connections::record_close(&self.metrics);
                info!(conn_id = %handle.id, user_id = %handle.user_id, "Connection closed");
            }
            SessionState::Unauthenticated | SessionState::Closed => {}
        }
    }

    /// Send `operation-failed` to the caller only.
    pub fn report_failure(&self, handle: &ConnectionHandle, operation: &str, err: &AppError) {
        events::record_failure(&self.metrics);
        if err.kind.is_internal() {
            error!(
                conn_id = %handle.id,
                user_id = %handle.user_id,
                operation,
                error = %err,
                "Operation failed"
            );
        } else {
            debug!(
                conn_id = %handle.id,
                operation,
                reason = %err.message,
                "Operation rejected"
            );
        }
        self.deliver(handle, builder::build_operation_failed(operation, err));
    }

    async fn handle_history(&self, handle: &ConnectionHandle, peer_id: UserId) -> AppResult<()> {
        let profile = self.directory.find_profile(peer_id).await?;
        let conversation = self
            .store
            .find_or_create_conversation(handle.user_id, peer_id)
            .await?;
        let messages = self.store.get_messages(conversation.id).await?;

        let online = self.presence.is_online(peer_id);
        self.deliver(handle, builder::build_peer_profile(peer_id, profile, online));
        self.deliver(
            handle,
            builder::build_message_list(conversation.id, conversation.participants, messages),
        );
        Ok(())
    }

    async fn handle_send(&self, handle: &ConnectionHandle, payload: SendMessage) -> AppResult<()> {
        validator::validate_content(&payload.content, &self.config)?;

        let sender_id = handle.user_id;
        let peer_id = payload.peer_id;

        let conversation = self
            .store
            .find_or_create_conversation(sender_id, peer_id)
            .await?;
        let message = self
            .store
            .append_message(
                conversation.id,
                NewMessage::new(sender_id, payload.content.normalized()),
            )
            .await?;

        debug!(
            conversation_id = %conversation.id,
            message_id = %message.id,
            seq = message.seq,
            sender_id = %sender_id,
            "Message stored"
        );

        let messages = self.store.get_messages(conversation.id).await?;
        let list = builder::build_message_list(conversation.id, conversation.participants, messages);
        self.fan_out(&distinct_pair(sender_id, peer_id), &list);

        self.push_sidebars(sender_id, peer_id).await;
        Ok(())
    }

    async fn handle_sidebar(&self, handle: &ConnectionHandle) -> AppResult<()> {
        let summaries = self.aggregator.summarize(handle.user_id).await?;
        self.deliver(handle, OutboundEvent::Sidebar(summaries));
        Ok(())
    }

    async fn handle_seen(&self, handle: &ConnectionHandle, peer_id: UserId) -> AppResult<()> {
        let viewer = handle.user_id;
        let Some(conversation) = self.store.find_conversation(viewer, peer_id).await? else {
            debug!(user_id = %viewer, peer_id = %peer_id, "Seen for absent conversation ignored");
            return Ok(());
        };

        let changed = self.store.mark_seen(conversation.id, peer_id).await?;
        debug!(conversation_id = %conversation.id, changed, "Messages marked seen");

        self.push_sidebars(viewer, peer_id).await;
        Ok(())
    }

    /// Refresh the sidebars of both participants after a committed change.
    ///
    /// Each user is refreshed on its own: a failed summary is logged and
    /// skipped, never reported against the change that triggered it.
    async fn push_sidebars(&self, a: UserId, b: UserId) {
        for user_id in distinct_pair(a, b) {
            if let Err(err) = self.push_sidebar(user_id).await {
                events::record_failure(&self.metrics);
                error!(user_id = %user_id, error = %err, "Sidebar refresh failed");
            }
        }
    }

    /// Recompute and deliver a user's sidebar to all their handles.
    async fn push_sidebar(&self, user_id: UserId) -> AppResult<()> {
        if !self.presence.is_online(user_id) {
            return Ok(());
        }
        let summaries = self.aggregator.summarize(user_id).await?;
        self.fan_out(&[user_id], &OutboundEvent::Sidebar(summaries));
        Ok(())
    }

    fn fan_out(&self, users: &[UserId], event: &OutboundEvent) {
        for user in users {
            for handle in self.presence.handles_for(*user) {
                self.deliver(&handle, event.clone());
            }
        }
    }

    fn deliver(&self, handle: &ConnectionHandle, event: OutboundEvent) {
        let delivered = handle.send(event);
        events::record_delivery(&self.metrics, delivered);
    }
}

/// Distinct users of a pair; a self-conversation yields one user.
fn distinct_pair(a: UserId, b: UserId) -> Vec<UserId> {
    if a == b { vec![a] } else { vec![a, b] }
}
