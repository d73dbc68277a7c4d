//! Ping/pong heartbeat for connection keepalive.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};

use parley_core::config::RealtimeConfig;

use super::handle::ConnectionHandle;
use crate::message::builder;

/// Heartbeat configuration
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Inactivity after which the connection is considered dead
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: config.ping_interval(),
            ping_timeout: config.ping_timeout(),
        }
    }
}

/// Run the heartbeat loop for a connection.
///
/// Sends periodic pings and closes the handle once no inbound activity
/// has been seen within the timeout. Ends when the handle closes.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval_at(Instant::now() + config.ping_interval, config.ping_interval);

    loop {
        tokio::select! {
            _ = handle.closed() => break,
            _ = interval.tick() => {}
        }

        let idle = handle.idle_for();
        if idle > config.ping_timeout {
            tracing::warn!(
                conn_id = %handle.id,
                user_id = %handle.user_id,
                idle_ms = idle.as_millis() as u64,
                "Heartbeat timeout, closing connection"
            );
            handle.close();
            break;
        }

        if !handle.send(builder::build_ping()) && !handle.is_alive() {
            break;
        }
    }

    tracing::debug!(conn_id = %handle.id, "Heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::id::UserId;
    use tokio::sync::mpsc;

    use crate::message::types::OutboundEvent;

    fn config() -> HeartbeatConfig {
        HeartbeatConfig {
            ping_interval: Duration::from_secs(10),
            ping_timeout: Duration::from_secs(25),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_connection_is_closed_after_timeout() {
        let (tx, mut rx) = mpsc::channel(16);
        let handle = Arc::new(ConnectionHandle::new(UserId::new(), tx));

        let task = tokio::spawn(run_heartbeat(Arc::clone(&handle), config()));
        task.await.unwrap();

        assert!(!handle.is_alive());
        let mut pings = 0;
        while let Ok(event) = rx.try_recv() {
            assert!(matches!(event, OutboundEvent::Ping { .. }));
            pings += 1;
        }
        assert_eq!(pings, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_keeps_connection_alive() {
        let (tx, mut rx) = mpsc::channel(64);
        let handle = Arc::new(ConnectionHandle::new(UserId::new(), tx));
        let task = tokio::spawn(run_heartbeat(Arc::clone(&handle), config()));

        for _ in 0..6 {
            time::sleep(Duration::from_secs(10)).await;
            handle.touch();
        }
        assert!(handle.is_alive());

        handle.close();
        task.await.unwrap();
        assert!(rx.try_recv().is_ok());
    }
}
