//! The coordination hub: single owner of the registry, the chat session
//! table, and the name pool.
//!
//! Every mutation — admit, remove, chat transition, share fan-out —
//! serializes through one mutex, so no two connections can observe a
//! half-applied pair state and simultaneous chat requests resolve to
//! exactly one pending owner. All pushes inside the critical section are
//! non-blocking, which keeps the section bounded by snapshot construction.
//!
//! Per-connection FIFO ordering is the transport's obligation: one read
//! loop per socket, one `handle` call at a time per peer.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::chat::{RequestOutcome, SessionTable};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::identity::NameAssigner;
use crate::presence;
use crate::protocol::{ClientMessage, PresenceEntry, ServerMessage, ShareEnvelope};
use crate::registry::Registry;
use crate::share::{self, ShareRequest};

struct HubState {
    registry: Registry,
    names: NameAssigner,
    sessions: SessionTable,
}

/// Process-wide coordinator for all connected peers.
pub struct Hub {
    state: Mutex<HubState>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HubState {
                registry: Registry::new(),
                names: NameAssigner::new(),
                sessions: SessionTable::new(),
            }),
        }
    }

    /// Admit a connection under a client-supplied peer id.
    ///
    /// Assigns a display name, tells the peer who it is, and pushes fresh
    /// presence lists to everyone. Returns the assigned name.
    pub async fn admit(&self, peer_id: &str, connection: Connection) -> Result<String> {
        let mut state = self.state.lock().await;

        let in_use = state.registry.names_in_use();
        let display_name = state.names.assign(&in_use);
        state
            .registry
            .admit(peer_id, display_name.clone(), connection)?;

        // Identity lands before the first presence list: same queue, FIFO.
        if let Some(connection) = state.registry.lookup(peer_id) {
            let _ = connection.push(ServerMessage::CharacterAssigned {
                peer_id: peer_id.to_string(),
                display_name: display_name.clone(),
            });
        }
        presence::broadcast(&state.registry);

        info!(
            peer_id,
            display_name = %display_name,
            online = state.registry.len(),
            "peer admitted"
        );
        Ok(display_name)
    }

    /// Evict a peer and every chat session it was part of. Idempotent.
    ///
    /// The other end of a torn-down session is not notified; to it the
    /// counterpart simply vanishes from the next presence list.
    pub async fn remove(&self, peer_id: &str) {
        let mut state = self.state.lock().await;

        if state.registry.remove(peer_id).is_none() {
            return;
        }
        state.sessions.drop_peer(peer_id);
        presence::broadcast(&state.registry);

        info!(peer_id, online = state.registry.len(), "peer removed");
    }

    /// Handle one inbound frame from `from`.
    ///
    /// Called in arrival order per connection. Invalid requests never tear
    /// down the service; they answer the sender or are dropped.
    pub async fn handle(&self, from: &str, msg: ClientMessage) {
        match msg {
            ClientMessage::ShareNotification { to_peer_ids, share } => {
                self.handle_share(from, to_peer_ids, share).await;
            }
            ClientMessage::ChatRequest { to_peer_id } => {
                self.handle_chat_request(from, &to_peer_id).await;
            }
            ClientMessage::ChatAccept { to_peer_id } => {
                self.handle_chat_accept(from, &to_peer_id).await;
            }
            ClientMessage::ChatDecline { to_peer_id } => {
                self.handle_chat_decline(from, &to_peer_id).await;
            }
            ClientMessage::PrivateMessage {
                to_peer_id,
                content,
            } => {
                self.handle_private_message(from, &to_peer_id, content).await;
            }
        }
    }

    async fn handle_share(&self, from: &str, to_peer_ids: Vec<String>, share: ShareEnvelope) {
        let state = self.state.lock().await;

        let request = ShareRequest {
            sender_peer_id: from.to_string(),
            recipients: to_peer_ids,
            envelope: share,
        };
        let reply = match share::fan_out(&state.registry, &request) {
            Ok(report) => share::report_message(&state.registry, &report),
            Err(Error::Validation(reason)) => ServerMessage::ShareFailed { message: reason },
            Err(e) => {
                // Sender vanished mid-request; nobody left to answer.
                warn!(from, error = %e, "share submission dropped");
                return;
            }
        };

        if let Some(connection) = state.registry.lookup(from) {
            let _ = connection.push(reply);
        }
    }

    async fn handle_chat_request(&self, from: &str, to: &str) {
        let mut state = self.state.lock().await;

        if !state.registry.contains(from) || from == to {
            debug!(from, to, "chat request dropped");
            return;
        }

        if !state.registry.contains(to) {
            // Unreachable target: answer the requester, stay at NONE.
            if let Some(connection) = state.registry.lookup(from) {
                let _ = connection.push(ServerMessage::ChatDecline {
                    from_peer_id: to.to_string(),
                });
            }
            debug!(from, to, "chat request to unreachable peer");
            return;
        }

        match state.sessions.request(from, to) {
            RequestOutcome::Deliver => {
                let from_name = state
                    .registry
                    .display_name(from)
                    .unwrap_or_default()
                    .to_string();
                if let Some(target) = state.registry.lookup(to) {
                    let _ = target.push(ServerMessage::ChatRequest {
                        from_peer_id: from.to_string(),
                        from_name,
                    });
                }
                debug!(from, to, "chat request pending");
            }
            RequestOutcome::AlreadyPending | RequestOutcome::AlreadyActive => {
                debug!(from, to, "duplicate chat request ignored");
            }
        }
    }

    async fn handle_chat_accept(&self, from: &str, to: &str) {
        let mut state = self.state.lock().await;

        if !state.sessions.accept(from, to) {
            debug!(from, to, "invalid chat accept ignored");
            return;
        }

        let from_name = state
            .registry
            .display_name(from)
            .unwrap_or_default()
            .to_string();
        if let Some(requester) = state.registry.lookup(to) {
            let _ = requester.push(ServerMessage::ChatAccept {
                from_peer_id: from.to_string(),
                from_name,
            });
        }
        debug!(a = from, b = to, "chat session active");
    }

    async fn handle_chat_decline(&self, from: &str, to: &str) {
        let mut state = self.state.lock().await;

        if !state.sessions.decline(from, to) {
            debug!(from, to, "invalid chat decline ignored");
            return;
        }

        if let Some(requester) = state.registry.lookup(to) {
            let _ = requester.push(ServerMessage::ChatDecline {
                from_peer_id: from.to_string(),
            });
        }
        debug!(a = from, b = to, "chat request declined");
    }

    async fn handle_private_message(&self, from: &str, to: &str, content: String) {
        let state = self.state.lock().await;

        // No active session, no relay: dropped without error, no queueing.
        if !state.sessions.is_active(from, to) {
            debug!(from, to, "private message outside active session dropped");
            return;
        }

        if let Some(connection) = state.registry.lookup(to) {
            let _ = connection.push(ServerMessage::PrivateMessage {
                from_peer_id: from.to_string(),
                content,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Current peer list, for the active-users route.
    pub async fn snapshot(&self) -> Vec<PresenceEntry> {
        self.state.lock().await.registry.snapshot()
    }

    /// Number of registered peers.
    pub async fn online_count(&self) -> usize {
        self.state.lock().await.registry.len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
