//! Builds the sidebar for one user.

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::warn;

use parley_core::result::AppResult;
use parley_core::types::id::UserId;
use parley_database::repositories::{ConversationStore, UserDirectory};
use parley_entity::conversation::Conversation;

use super::summary::{ConversationSummary, MessagePreview, PeerSummary};
use crate::presence::registry::PresenceRegistry;

/// Conversations summarized at once; each one costs a message read and a
/// profile lookup against the shared pool.
const SUMMARY_CONCURRENCY: usize = 8;

/// Computes [`ConversationSummary`] lists on demand.
///
/// Each conversation is read as its own snapshot; the list as a whole is
/// not a consistent cut across conversations.
#[derive(Debug, Clone)]
pub struct ConversationAggregator {
    store: Arc<dyn ConversationStore>,
    directory: Arc<dyn UserDirectory>,
    presence: Arc<PresenceRegistry>,
}

impl ConversationAggregator {
    /// Create a new aggregator
    pub fn new(
        store: Arc<dyn ConversationStore>,
        directory: Arc<dyn UserDirectory>,
        presence: Arc<PresenceRegistry>,
    ) -> Self {
        Self {
            store,
            directory,
            presence,
        }
    }

    /// Summaries of every conversation `user` takes part in, most recent first.
    pub async fn summarize(&self, user: UserId) -> AppResult<Vec<ConversationSummary>> {
        let conversations = self.store.list_conversations_for(user).await?;

        let mut summaries: Vec<ConversationSummary> = stream::iter(&conversations)
            .map(|conversation| self.summarize_one(user, conversation))
            .buffer_unordered(SUMMARY_CONCURRENCY)
            .boxed()
            .try_collect::<Vec<_>>()
            .await?
            .into_iter()
            .flatten()
            .collect();

        summaries.sort_by(|a, b| {
            b.last_activity_at
                .cmp(&a.last_activity_at)
                .then_with(|| a.conversation_id.cmp(&b.conversation_id))
        });
        Ok(summaries)
    }

    async fn summarize_one(
        &self,
        user: UserId,
        conversation: &Conversation,
    ) -> AppResult<Option<ConversationSummary>> {
        let Some(peer_id) = conversation.peer_of(user) else {
            return Ok(None);
        };

        let messages = self.store.get_messages(conversation.id).await?;
        let unseen_count = messages
            .iter()
            .filter(|m| m.is_authored_by(peer_id) && !m.seen)
            .count() as u64;
        let last_message = messages.last().map(MessagePreview::from);
        let last_activity_at = last_message
            .as_ref()
            .map(|m| m.created_at)
            .unwrap_or(conversation.created_at);

        let peer = match self.directory.find_profile(peer_id).await {
            Ok(profile) => profile.map(PeerSummary::from),
            Err(e) => {
                warn!(peer_id = %peer_id, error = %e, "Peer profile lookup failed");
                None
            }
        };

        Ok(Some(ConversationSummary {
            conversation_id: conversation.id,
            peer_id,
            peer,
            peer_online: self.presence.is_online(peer_id),
            last_message,
            unseen_count,
            last_activity_at,
        }))
    }
}
