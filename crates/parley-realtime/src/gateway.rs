//! Transport-agnostic session driver.
//!
//! The HTTP layer hands each upgraded socket to [`ConnectionGateway::serve`]
//! as a stream of inbound text frames and a sink for outbound ones.

use std::fmt::Display;
use std::sync::Arc;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use parley_core::config::RealtimeConfig;
use parley_core::error::AppError;

use crate::connection::handle::ConnectionHandle;
use crate::connection::heartbeat::{HeartbeatConfig, run_heartbeat};
use crate::message::serializer;
use crate::message::types::OutboundEvent;
use crate::message::validator;
use crate::router::{MessageRouter, Session};

/// Operation name reported when an inbound frame cannot be decoded.
const DECODE_OPERATION: &str = "decode";

/// Runs one connection from authentication to teardown.
#[derive(Debug, Clone)]
pub struct ConnectionGateway {
    router: Arc<MessageRouter>,
    config: RealtimeConfig,
    shutdown: broadcast::Sender<()>,
}

impl ConnectionGateway {
    /// Create a new gateway
    pub fn new(
        router: Arc<MessageRouter>,
        config: RealtimeConfig,
        shutdown: broadcast::Sender<()>,
    ) -> Self {
        Self {
            router,
            config,
            shutdown,
        }
    }

    /// Serve one connection until it ends.
    ///
    /// Ends on stream end, transport error, `disconnect`, heartbeat timeout
    /// or engine shutdown. Every exit path deregisters the connection.
    pub async fn serve<I, E, O>(&self, credential: Option<String>, inbound: I, outbound: O)
    where
        I: Stream<Item = Result<String, E>> + Send,
        E: Display + Send,
        O: Sink<String> + Send + 'static,
        O::Error: Display + Send,
    {
        let mut shutdown_rx = self.shutdown.subscribe();
        let (tx, mut rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let mut session = Session::new();

        let handle = match self
            .router
            .connect(&mut session, credential.as_deref(), tx)
            .await
        {
            Ok(handle) => handle,
            Err(_) => {
                let mut outbound = std::pin::pin!(outbound);
                while let Ok(event) = rx.try_recv() {
                    write_event(&mut outbound, &event).await;
                }
                let _ = outbound.close().await;
                return;
            }
        };

        let forwarder = tokio::spawn(forward_outbound(rx, outbound, Arc::clone(&handle)));
        let heartbeat = tokio::spawn(run_heartbeat(
            Arc::clone(&handle),
            HeartbeatConfig::from(&self.config),
        ));

        let mut inbound = std::pin::pin!(inbound);
        loop {
            tokio::select! {
                _ = handle.closed() => break,
                _ = shutdown_rx.recv() => {
                    debug!(conn_id = %handle.id, "Engine shutdown, closing connection");
                    break;
                }
                frame = inbound.next() => match frame {
                    Some(Ok(text)) => {
                        self.handle_frame(&mut session, &handle, &text).await;
                        if session.is_closed() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(conn_id = %handle.id, error = %e, "Transport error");
                        break;
                    }
                    None => break,
                },
            }
        }

        self.router.disconnect(&mut session);
        heartbeat.abort();
        if let Err(e) = forwarder.await {
            if !e.is_cancelled() {
                warn!(conn_id = %handle.id, error = %e, "Outbound forwarder failed");
            }
        }
    }

    async fn handle_frame(&self, session: &mut Session, handle: &ConnectionHandle, text: &str) {
        if let Err(err) = validator::validate_frame(text, self.config.max_frame_bytes) {
            self.router.report_failure(handle, DECODE_OPERATION, &err);
            return;
        }

        match serializer::deserialize_inbound(text) {
            Ok(event) => self.router.dispatch(session, event).await,
            Err(e) => {
                let err = AppError::validation(format!("Malformed event: {e}"));
                self.router.report_failure(handle, DECODE_OPERATION, &err);
            }
        }
    }
}

/// Drain the connection's queue into the transport until the handle closes,
/// then flush what is already queued and close the sink.
async fn forward_outbound<O>(
    mut rx: mpsc::Receiver<OutboundEvent>,
    outbound: O,
    handle: Arc<ConnectionHandle>,
) where
    O: Sink<String> + Send + 'static,
    O::Error: Display + Send,
{
    let mut outbound = std::pin::pin!(outbound);

    loop {
        tokio::select! {
            biased;
            event = rx.recv() => match event {
                Some(event) => {
                    if !write_event(&mut outbound, &event).await {
                        handle.close();
                        break;
                    }
                }
                None => break,
            },
            _ = handle.closed() => {
                while let Ok(event) = rx.try_recv() {
                    if !write_event(&mut outbound, &event).await {
                        break;
                    }
                }
                break;
            }
        }
    }

    let _ = outbound.close().await;
    debug!(conn_id = %handle.id, "Outbound forwarder ended");
}

/// Serialize and write one event. Returns `false` if the transport failed.
async fn write_event<O>(outbound: &mut std::pin::Pin<&mut O>, event: &OutboundEvent) -> bool
where
    O: Sink<String>,
    O::Error: Display,
{
    let text = match serializer::serialize_outbound(event) {
        Ok(text) => text,
        Err(e) => {
            warn!(event = event.name(), error = %e, "Failed to serialize outbound event");
            return true;
        }
    };

    match outbound.send(text).await {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Outbound transport closed");
            false
        }
    }
}

