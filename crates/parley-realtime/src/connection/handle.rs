//! Individual connection handle.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use parley_core::types::id::{ConnectionId, UserId};

use crate::message::types::OutboundEvent;

/// A handle to a single live connection bound to a user.
///
/// Outbound events are queued on a bounded channel drained by the
/// connection's forwarder task. Once closed, the handle drops everything
/// sent to it.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// User who owns this connection
    pub user_id: UserId,
    /// Sender for outbound events
    sender: mpsc::Sender<OutboundEvent>,
    /// Last inbound sign of life (any event, including pong)
    last_activity: Mutex<Instant>,
    /// Whether the connection is still alive
    alive: AtomicBool,
    /// Cancelled when the connection closes
    closed: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(user_id: UserId, sender: mpsc::Sender<OutboundEvent>) -> Self {
        Self {
            id: ConnectionId::new(),
            user_id,
            sender,
            last_activity: Mutex::new(Instant::now()),
            alive: AtomicBool::new(true),
            closed: CancellationToken::new(),
        }
    }

    /// Queue an outbound event. Returns `false` if it was dropped.
    pub fn send(&self, event: OutboundEvent) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    conn_id = %self.id,
                    event = event.name(),
                    "Connection send buffer full, dropping event"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.close();
                false
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection closed. Returns `true` for the call that closed it.
    pub fn close(&self) -> bool {
        let was_alive = self.alive.swap(false, Ordering::SeqCst);
        self.closed.cancel();
        was_alive
    }

    /// Resolves once the connection is closed.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }

    /// Record inbound activity
    pub fn touch(&self) {
        let mut last = self
            .last_activity
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *last = Instant::now();
    }

    /// Time since the last inbound activity
    pub fn idle_for(&self) -> std::time::Duration {
        let last = self
            .last_activity
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        last.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping() -> OutboundEvent {
        OutboundEvent::Ping { timestamp: 0 }
    }

    #[tokio::test]
    async fn test_send_is_dropped_after_close() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(UserId::new(), tx);

        assert!(handle.send(ping()));
        assert!(handle.close());
        assert!(!handle.close());
        assert!(!handle.send(ping()));

        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_buffer_drops_without_closing() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(UserId::new(), tx);

        assert!(handle.send(ping()));
        assert!(!handle.send(ping()));
        assert!(handle.is_alive());
    }

    #[tokio::test]
    async fn test_dropped_receiver_closes_handle() {
        let (tx, rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(UserId::new(), tx);
        drop(rx);

        assert!(!handle.send(ping()));
        assert!(!handle.is_alive());
        handle.closed().await;
    }
}
