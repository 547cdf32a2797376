//! Peer-side connection management: dial the service, stay connected,
//! reconnect forever.
//!
//! Connection loss is a lifecycle event, not an error. Every attempt joins
//! as a brand-new peer — fresh id, fresh display name, empty chat state —
//! with a fixed delay between attempts and no retry cap. The fixed delay
//! favors availability over thundering-herd protection, which is the right
//! trade at the peer counts this service is built for.

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RECONNECT_DELAY_MS;
use crate::error::Result;
use crate::protocol::{ClientMessage, ServerMessage};

/// Lifecycle and traffic events surfaced to the presentation layer.
#[derive(Debug)]
pub enum ClientEvent {
    /// A connection opened under a fresh peer id.
    Opened { peer_id: String },
    /// A frame arrived from the service.
    Message(ServerMessage),
    /// The connection closed; a reconnect follows unless shutdown was asked.
    Closed,
}

/// How one connection attempt ended.
enum SessionEnd {
    Lost,
    Shutdown,
}

/// Reconnecting client for the coordination service.
pub struct PeerClient {
    server_url: String,
    reconnect_delay: Duration,
    events: mpsc::Sender<ClientEvent>,
    commands: mpsc::Receiver<ClientMessage>,
    shutdown: watch::Receiver<bool>,
}

impl PeerClient {
    /// `server_url` is the http(s) base or ws(s) base of the service,
    /// e.g. `ws://192.168.1.20:8001`.
    pub fn new(
        server_url: impl Into<String>,
        events: mpsc::Sender<ClientEvent>,
        commands: mpsc::Receiver<ClientMessage>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
            events,
            commands,
            shutdown,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Connect and keep reconnecting until shutdown is signalled.
    pub async fn run(mut self) -> Result<()> {
        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let peer_id = fresh_peer_id();
            match self.session(&peer_id).await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Lost) => {
                    info!(peer_id = %peer_id, "connection lost, reconnecting");
                    let _ = self.events.send(ClientEvent::Closed).await;
                }
                Err(e) => {
                    warn!(peer_id = %peer_id, error = %e, "connection attempt failed");
                    let _ = self.events.send(ClientEvent::Closed).await;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("client shut down");
        Ok(())
    }

    async fn session(&mut self, peer_id: &str) -> Result<SessionEnd> {
        let url = session_url(&self.server_url, peer_id);
        let (ws, _) = connect_async(&url).await?;
        info!(peer_id, "connected");
        let _ = self
            .events
            .send(ClientEvent::Opened {
                peer_id: peer_id.to_string(),
            })
            .await;

        let (mut sink, mut stream) = ws.split();

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        let _ = sink.send(Message::Close(None)).await;
                        return Ok(SessionEnd::Shutdown);
                    }
                }
                command = self.commands.recv() => {
                    match command {
                        Some(msg) => {
                            let text = msg.to_json()?;
                            if sink.send(Message::Text(text)).await.is_err() {
                                return Ok(SessionEnd::Lost);
                            }
                        }
                        // Command side dropped: deliberate teardown.
                        None => {
                            let _ = sink.send(Message::Close(None)).await;
                            return Ok(SessionEnd::Shutdown);
                        }
                    }
                }
                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            match ServerMessage::from_json(&text) {
                                Ok(msg) => {
                                    let _ = self.events.send(ClientEvent::Message(msg)).await;
                                }
                                Err(e) => debug!(error = %e, "ignoring unparseable frame"),
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => return Ok(SessionEnd::Lost),
                        Some(Ok(_)) => {} // ping/pong handled by the library
                        Some(Err(e)) => {
                            warn!(error = %e, "websocket error");
                            return Ok(SessionEnd::Lost);
                        }
                    }
                }
            }
        }
    }
}

/// A fresh opaque peer id. Never reused: a reconnect is a new peer.
pub fn fresh_peer_id() -> String {
    format!("peer-{}", Uuid::new_v4())
}

fn session_url(server_url: &str, peer_id: &str) -> String {
    format!("{}/api/ws/{}", server_url.trim_end_matches('/'), peer_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_peer_ids_are_unique() {
        let a = fresh_peer_id();
        let b = fresh_peer_id();
        assert_ne!(a, b);
        assert!(a.starts_with("peer-"));
    }

    #[test]
    fn test_session_url() {
        assert_eq!(
            session_url("ws://localhost:8001", "peer-1"),
            "ws://localhost:8001/api/ws/peer-1"
        );
        assert_eq!(
            session_url("ws://localhost:8001/", "peer-1"),
            "ws://localhost:8001/api/ws/peer-1"
        );
    }

    #[test]
    fn test_default_delay_is_fixed_three_seconds() {
        let (events, _) = mpsc::channel(8);
        let (_commands_tx, commands) = mpsc::channel(8);
        let (_shutdown_tx, shutdown) = watch::channel(false);
        let client = PeerClient::new("ws://localhost:8001", events, commands, shutdown);
        assert_eq!(client.reconnect_delay, Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_shutdown_before_first_attempt_terminates() {
        let (events, _events_rx) = mpsc::channel(8);
        let (_commands_tx, commands) = mpsc::channel(8);
        let (shutdown_tx, shutdown) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        let client = PeerClient::new("ws://localhost:1", events, commands, shutdown);
        tokio::time::timeout(Duration::from_secs(1), client.run())
            .await
            .expect("run() must return promptly after shutdown")
            .unwrap();
    }
}
