//! Run command - starts the coordination service.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use driftdrop_core::{Config, ContentStore, Hub, MemoryStore};

use crate::handlers::{content, ws, AppState};

pub async fn execute(config_path: Option<String>, bind: Option<String>) -> Result<()> {
    // Load configuration
    let mut config = if let Some(path) = config_path {
        info!("Loading config from: {}", path);
        let contents = std::fs::read_to_string(&path)?;
        serde_json::from_str(&contents)?
    } else {
        Config::load_with_env()?
    };
    if let Some(bind) = bind {
        config.bind_addr = bind;
    }

    info!("driftdrop daemon v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState {
        hub: Arc::new(Hub::new()),
        store: Arc::new(MemoryStore::from_config(&config)) as Arc<dyn ContentStore>,
        config: Arc::new(config.clone()),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Daemon stopped gracefully");
    Ok(())
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    // The HTTP body limit sits above the store ceiling so the store's own
    // rejection reason, not a generic 413, is what senders see.
    let body_limit = (state.config.max_payload_bytes as usize).saturating_add(1024 * 1024);

    Router::new()
        .route("/api/health", get(content::health))
        .route("/api/active-users", get(content::active_users))
        .route("/api/ws/:peer_id", get(ws::ws_handler))
        .route("/api/upload", post(content::upload_file))
        .route("/api/create-text-share", post(content::create_text_share))
        .route("/api/download/:id", get(content::download))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                info!("Received Ctrl+C");
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C"),
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    type WsClient = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn spawn_service() -> SocketAddr {
        let state = AppState {
            hub: Arc::new(Hub::new()),
            store: Arc::new(MemoryStore::new()) as Arc<dyn ContentStore>,
            config: Arc::new(Config::default()),
        };
        let app = router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn connect(addr: SocketAddr, peer_id: &str) -> WsClient {
        let url = format!("ws://{addr}/api/ws/{peer_id}");
        let (ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
        ws
    }

    /// Next frame of the given type, skipping others (e.g. interleaved
    /// presence updates).
    async fn recv_typed(ws: &mut WsClient, expected: &str) -> serde_json::Value {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("timed out waiting for frame")
                .expect("stream ended")
                .expect("websocket error");
            if let WsMessage::Text(text) = frame {
                let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                if value["type"] == expected {
                    return value;
                }
            }
        }
    }

    /// Next user_list_update with the expected number of entries.
    async fn recv_user_list(ws: &mut WsClient, expected_len: usize) -> serde_json::Value {
        loop {
            let value = recv_typed(ws, "user_list_update").await;
            if value["users"].as_array().unwrap().len() == expected_len {
                return value;
            }
        }
    }

    #[tokio::test]
    async fn test_full_session_over_websocket() {
        let addr = spawn_service().await;

        // A joins and is told who it is.
        let mut ws_a = connect(addr, "peer-a").await;
        let assigned = recv_typed(&mut ws_a, "character_assigned").await;
        assert_eq!(assigned["peer_id"], "peer-a");
        let name_a = assigned["display_name"].as_str().unwrap().to_string();
        assert!(!name_a.is_empty());

        // B joins; both sides see exactly the other.
        let mut ws_b = connect(addr, "peer-b").await;
        let a_list = recv_user_list(&mut ws_a, 1).await;
        assert_eq!(a_list["users"][0]["peer_id"], "peer-b");
        let b_list = recv_user_list(&mut ws_b, 1).await;
        assert_eq!(b_list["users"][0]["peer_id"], "peer-a");

        // A shares a text note with B.
        let share = serde_json::json!({
            "type": "share_notification",
            "to_peer_ids": ["peer-b"],
            "share": { "kind": "text", "share_id": "s1", "title": "Shared Note", "content": "hi" }
        });
        ws_a.send(WsMessage::Text(share.to_string())).await.unwrap();

        let incoming = recv_typed(&mut ws_b, "incoming_share").await;
        assert_eq!(incoming["from_peer_id"], "peer-a");
        assert_eq!(incoming["from_name"], name_a.as_str());
        assert_eq!(incoming["share"]["content"], "hi");

        let outcome = recv_typed(&mut ws_a, "share_success").await;
        assert!(outcome["message"].as_str().unwrap().contains('1'));

        // B disconnects; A's presence list empties out.
        ws_b.send(WsMessage::Close(None)).await.unwrap();
        recv_user_list(&mut ws_a, 0).await;
    }

    #[tokio::test]
    async fn test_chat_handshake_over_websocket() {
        let addr = spawn_service().await;
        let mut ws_a = connect(addr, "chat-a").await;
        let mut ws_b = connect(addr, "chat-b").await;
        recv_user_list(&mut ws_a, 1).await;
        recv_user_list(&mut ws_b, 1).await;

        let request = serde_json::json!({ "type": "chat_request", "to_peer_id": "chat-b" });
        ws_a.send(WsMessage::Text(request.to_string()))
            .await
            .unwrap();
        let delivered = recv_typed(&mut ws_b, "chat_request").await;
        assert_eq!(delivered["from_peer_id"], "chat-a");

        let accept = serde_json::json!({ "type": "chat_accept", "to_peer_id": "chat-a" });
        ws_b.send(WsMessage::Text(accept.to_string())).await.unwrap();
        let accepted = recv_typed(&mut ws_a, "chat_accept").await;
        assert_eq!(accepted["from_peer_id"], "chat-b");

        let pm = serde_json::json!({
            "type": "private_message", "to_peer_id": "chat-b", "content": "hello"
        });
        ws_a.send(WsMessage::Text(pm.to_string())).await.unwrap();
        let relayed = recv_typed(&mut ws_b, "private_message").await;
        assert_eq!(relayed["from_peer_id"], "chat-a");
        assert_eq!(relayed["content"], "hello");
    }

    #[tokio::test]
    async fn test_duplicate_peer_id_rejected() {
        let addr = spawn_service().await;
        let mut ws_first = connect(addr, "dup").await;
        recv_typed(&mut ws_first, "character_assigned").await;

        // Second socket under the same id is closed without admission.
        let mut ws_second = connect(addr, "dup").await;
        let frame = tokio::time::timeout(Duration::from_secs(5), ws_second.next())
            .await
            .expect("timed out");
        match frame {
            Some(Ok(WsMessage::Close(_))) | None => {}
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_content_routes() {
        let addr = spawn_service().await;
        let client = reqwest::Client::new();

        let health: serde_json::Value = client
            .get(format!("http://{addr}/api/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "healthy");

        let envelope: serde_json::Value = client
            .post(format!("http://{addr}/api/create-text-share"))
            .json(&serde_json::json!({ "content": "note body" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(envelope["kind"], "text");
        assert_eq!(envelope["title"], "Shared Note");
        let share_id = envelope["share_id"].as_str().unwrap();

        let body = client
            .get(format!("http://{addr}/api/download/{share_id}"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "note body");

        let missing = client
            .get(format!("http://{addr}/api/download/no-such-id"))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
