//! WebSocket endpoint: one connection per peer.
//!
//! Frames from a single socket are processed strictly in arrival order;
//! there is no ordering guarantee across sockets. Closing the socket, for
//! any reason, evicts the peer and cancels all further deliveries to it.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use driftdrop_core::connection::{Connection, DEFAULT_QUEUE};
use driftdrop_core::protocol::ClientMessage;

use super::AppState;

/// Upgrade handler for `GET /api/ws/:peer_id`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(peer_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, peer_id, state))
}

/// Drive a single peer's connection from admission to eviction.
async fn handle_socket(mut socket: WebSocket, peer_id: String, state: AppState) {
    let (connection, mut rx) = Connection::channel(DEFAULT_QUEUE);

    let display_name = match state.hub.admit(&peer_id, connection).await {
        Ok(name) => name,
        Err(e) => {
            warn!(peer_id = %peer_id, error = %e, "admission rejected");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    debug!(peer_id = %peer_id, display_name = %display_name, "socket open");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer: drain the hub-facing queue onto the wire.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match msg.to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "dropping unserializable frame");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Reader: FIFO per connection.
    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => match ClientMessage::from_json(&text) {
                Ok(msg) => state.hub.handle(&peer_id, msg).await,
                Err(e) => {
                    debug!(peer_id = %peer_id, error = %e, "ignoring malformed frame");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // ping/pong handled by axum, binary ignored
            Err(e) => {
                debug!(peer_id = %peer_id, error = %e, "websocket error");
                break;
            }
        }
    }

    // Eviction drops the hub's sender; the writer drains and exits.
    state.hub.remove(&peer_id).await;
    let _ = send_task.await;
    debug!(peer_id = %peer_id, "socket closed");
}
