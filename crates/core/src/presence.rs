//! Presence propagation.
//!
//! On every registry change the hub calls [`broadcast`], which computes the
//! snapshot once and pushes a `user_list_update` to every registered
//! connection. Lists are peer-relative: each delivery excludes the
//! receiving peer itself. Delivery is fire-and-forget per connection, so a
//! dead socket never blocks or fails the others; a peer that raced a
//! concurrent admission sees a stale-by-one list until the next update.

use tracing::debug;

use crate::protocol::ServerMessage;
use crate::registry::Registry;

/// Push the current peer list to every registered connection.
pub fn broadcast(registry: &Registry) {
    let snapshot = registry.snapshot();

    for (peer_id, entry) in registry.entries() {
        let users: Vec<_> = snapshot
            .iter()
            .filter(|user| user.peer_id != peer_id)
            .cloned()
            .collect();

        if entry
            .connection
            .push(ServerMessage::UserListUpdate { users })
            .is_err()
        {
            // Lifecycle, not an error: the socket is closing and eviction
            // will follow on its own.
            debug!(peer_id, "presence delivery skipped, connection closed");
        }
    }
}
