//! Connection session state.

use std::sync::Arc;

use parley_core::types::id::UserId;

use crate::connection::handle::ConnectionHandle;

/// Lifecycle of one connection.
#[derive(Debug, Default)]
pub enum SessionState {
    /// Credential not yet checked.
    #[default]
    Unauthenticated,
    /// Bound to a user and registered for presence.
    Authenticated(Arc<ConnectionHandle>),
    /// Terminal; no further events are processed.
    Closed,
}

/// One connection as seen by the router.
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) state: SessionState,
}

impl Session {
    /// A fresh, unauthenticated session
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The bound handle while authenticated
    pub fn handle(&self) -> Option<&Arc<ConnectionHandle>> {
        match &self.state {
            SessionState::Authenticated(handle) => Some(handle),
            _ => None,
        }
    }

    /// The bound user while authenticated
    pub fn user_id(&self) -> Option<UserId> {
        self.handle().map(|handle| handle.user_id)
    }

    /// Whether the session reached its terminal state
    pub fn is_closed(&self) -> bool {
        matches!(self.state, SessionState::Closed)
    }
}
