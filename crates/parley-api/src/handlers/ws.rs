//! WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt, future};
use serde::Deserialize;
use tracing::debug;

use crate::state::AppState;

/// Query parameters for WebSocket authentication.
#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    /// JWT access token. A missing token is reported over the socket.
    pub token: Option<String>,
}

/// GET /ws?token={jwt}
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Response {
    // Oversized frames up to this bound reach the validator and are
    // answered with `operation-failed`; beyond it the transport drops them.
    let transport_limit = state.config.realtime.max_frame_bytes.saturating_mul(4);

    ws.max_message_size(transport_limit)
        .on_upgrade(move |socket| handle_socket(state, query.token, socket))
}

/// Adapts an upgraded socket to the gateway's text-frame stream and sink.
async fn handle_socket(state: AppState, token: Option<String>, socket: WebSocket) {
    let (ws_tx, ws_rx) = socket.split();

    let inbound = ws_rx
        .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
        .filter_map(|frame| {
            future::ready(match frame {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
        });

    let outbound = ws_tx.with(|text: String| {
        future::ready(Ok::<_, axum::Error>(Message::Text(text.into())))
    });

    state.realtime.gateway.serve(token, inbound, outbound).await;
    debug!("WebSocket session ended");
}

