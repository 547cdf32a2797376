//! Service-side handle to one peer's bidirectional channel.
//!
//! The transport (a WebSocket task in the daemon, a plain channel in tests)
//! owns the receiving half and drains it onto the wire. A connection is
//! open exactly while that receiver lives; the registry entry for a peer
//! never outlives its connection.

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::protocol::ServerMessage;

/// Outbound queue depth per connection. A peer this far behind is treated
/// the same as a disconnected one.
pub const DEFAULT_QUEUE: usize = 32;

/// Sending half of one peer's connection.
#[derive(Debug, Clone)]
pub struct Connection {
    tx: mpsc::Sender<ServerMessage>,
}

impl Connection {
    /// Create a connection and the receiving half the transport drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue a message without blocking.
    ///
    /// Failure means the peer is gone or hopelessly backlogged; callers
    /// treat both the same as a disconnected recipient.
    pub fn push(&self, msg: ServerMessage) -> Result<()> {
        self.tx
            .try_send(msg)
            .map_err(|e| Error::Transport(e.to_string()))
    }

    /// Whether the receiving half still exists.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_delivers() {
        let (conn, mut rx) = Connection::channel(4);
        conn.push(ServerMessage::ShareSuccess {
            message: "ok".to_string(),
        })
        .unwrap();

        match rx.try_recv().unwrap() {
            ServerMessage::ShareSuccess { message } => assert_eq!(message, "ok"),
            other => panic!("wrong message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_push_to_dropped_receiver_fails() {
        let (conn, rx) = Connection::channel(4);
        assert!(conn.is_open());

        drop(rx);
        assert!(!conn.is_open());
        let result = conn.push(ServerMessage::UserListUpdate { users: vec![] });
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_push_to_full_queue_fails() {
        let (conn, _rx) = Connection::channel(1);
        conn.push(ServerMessage::UserListUpdate { users: vec![] })
            .unwrap();
        let result = conn.push(ServerMessage::UserListUpdate { users: vec![] });
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
