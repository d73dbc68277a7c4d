//! Registry of live connections per user.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, info};

use parley_core::types::id::{ConnectionId, UserId};

use crate::connection::handle::ConnectionHandle;
use crate::message::builder;
use crate::message::types::OutboundEvent;
use crate::metrics::{RealtimeMetrics, events};

/// Effect of a register/deregister call on the user's presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceTransition {
    /// The user's first connection was added.
    CameOnline,
    /// The user's last connection was removed.
    WentOffline,
    /// Only the connection count changed (or nothing did).
    Unchanged,
}

/// Single source of truth for who is online.
///
/// A user is online while at least one handle is registered. Transitions
/// broadcast an `online-users` snapshot to every registered handle; the
/// revision lets clients discard snapshots that arrive out of order.
#[derive(Debug)]
pub struct PresenceRegistry {
    /// User → handles in registration order
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
    /// Last broadcast revision
    revision: AtomicU64,
    metrics: Arc<RealtimeMetrics>,
}

impl PresenceRegistry {
    /// Create an empty registry
    pub fn new(metrics: Arc<RealtimeMetrics>) -> Self {
        Self {
            by_user: DashMap::new(),
            revision: AtomicU64::new(0),
            metrics,
        }
    }

    /// Add a handle under its user. Registering the same handle twice is a no-op.
    pub fn register(&self, handle: Arc<ConnectionHandle>) -> PresenceTransition {
        let user_id = handle.user_id;
        let conn_id = handle.id;

        let came_online = {
            let mut handles = self.by_user.entry(user_id).or_default();
            if handles.iter().any(|h| h.id == conn_id) {
                return PresenceTransition::Unchanged;
            }
            let was_empty = handles.is_empty();
            handles.push(handle);
            was_empty
        };

        debug!(user_id = %user_id, conn_id = %conn_id, "Connection registered");

        if came_online {
            info!(user_id = %user_id, "User came online");
            self.broadcast_online();
            PresenceTransition::CameOnline
        } else {
            PresenceTransition::Unchanged
        }
    }

    /// Remove one handle. Unknown handles are ignored.
    pub fn deregister(&self, user_id: UserId, conn_id: ConnectionId) -> PresenceTransition {
        let removed = match self.by_user.get_mut(&user_id) {
            Some(mut handles) => {
                let before = handles.len();
                handles.retain(|h| h.id != conn_id);
                handles.len() < before
            }
            None => false,
        };

        if !removed {
            return PresenceTransition::Unchanged;
        }

        debug!(user_id = %user_id, conn_id = %conn_id, "Connection deregistered");

        // A concurrent register may have refilled the entry; only an empty
        // entry is removed, and only its remover reports the transition.
        let went_offline = self
            .by_user
            .remove_if(&user_id, |_, handles| handles.is_empty())
            .is_some();

        if went_offline {
            info!(user_id = %user_id, "User went offline");
            self.broadcast_online();
            PresenceTransition::WentOffline
        } else {
            PresenceTransition::Unchanged
        }
    }

    /// Whether the user has at least one live handle
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.by_user
            .get(&user_id)
            .is_some_and(|handles| !handles.is_empty())
    }

    /// Sorted ids of every online user
    pub fn list_online(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .by_user
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| *entry.key())
            .collect();
        users.sort();
        users
    }

    /// Handles of one user in registration order
    pub fn handles_for(&self, user_id: UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(&user_id)
            .map(|handles| handles.value().clone())
            .unwrap_or_default()
    }

    /// Every registered handle
    pub fn all_handles(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of online users
    pub fn online_count(&self) -> usize {
        self.by_user
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .count()
    }

    /// Number of registered handles
    pub fn connection_count(&self) -> usize {
        self.by_user.iter().map(|entry| entry.value().len()).sum()
    }

    /// Current presence snapshot without bumping the revision
    pub fn snapshot(&self) -> OutboundEvent {
        builder::build_online_users(self.list_online(), self.revision.load(Ordering::SeqCst))
    }

    /// Close every registered handle; each session then deregisters itself.
    pub fn close_all(&self) {
        for handle in self.all_handles() {
            handle.close();
        }
    }

    fn broadcast_online(&self) {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let event = builder::build_online_users(self.list_online(), revision);
        events::record_presence_broadcast(&self.metrics);

        for handle in self.all_handles() {
            let delivered = handle.send(event.clone());
            events::record_delivery(&self.metrics, delivered);
        }
    }
}
