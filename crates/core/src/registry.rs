//! Process-wide table of connected peers.
//!
//! Single source of truth for "who is online": a peer id appears here if
//! and only if its connection is open. The table itself is plain data; the
//! hub serializes every mutation behind one lock.

use std::collections::{HashMap, HashSet};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::protocol::PresenceEntry;

/// One registered peer.
#[derive(Debug)]
pub struct PeerEntry {
    pub display_name: String,
    pub connection: Connection,
}

/// Registry of all connected peers, keyed by client-generated peer id.
#[derive(Debug, Default)]
pub struct Registry {
    peers: HashMap<String, PeerEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a peer under a client-supplied id.
    ///
    /// Rejects empty ids and collisions; a peer id is never silently
    /// rebound to a different connection.
    pub fn admit(&mut self, peer_id: &str, display_name: String, connection: Connection) -> Result<()> {
        if peer_id.is_empty() {
            return Err(Error::Validation("empty peer id".to_string()));
        }
        if self.peers.contains_key(peer_id) {
            return Err(Error::PeerIdTaken(peer_id.to_string()));
        }

        self.peers.insert(
            peer_id.to_string(),
            PeerEntry {
                display_name,
                connection,
            },
        );
        Ok(())
    }

    /// Evict a peer. Idempotent: removing an absent id returns `None`.
    pub fn remove(&mut self, peer_id: &str) -> Option<PeerEntry> {
        self.peers.remove(peer_id)
    }

    /// Resolve a peer id to its connection.
    pub fn lookup(&self, peer_id: &str) -> Option<&Connection> {
        self.peers.get(peer_id).map(|entry| &entry.connection)
    }

    /// Display name of a registered peer.
    pub fn display_name(&self, peer_id: &str) -> Option<&str> {
        self.peers.get(peer_id).map(|entry| entry.display_name.as_str())
    }

    pub fn contains(&self, peer_id: &str) -> bool {
        self.peers.contains_key(peer_id)
    }

    /// Current peer list. Per-recipient self-exclusion is the presence
    /// broadcaster's job; this is the full set.
    pub fn snapshot(&self) -> Vec<PresenceEntry> {
        self.peers
            .iter()
            .map(|(peer_id, entry)| PresenceEntry {
                peer_id: peer_id.clone(),
                display_name: entry.display_name.clone(),
            })
            .collect()
    }

    /// Display names currently held by registered peers.
    pub fn names_in_use(&self) -> HashSet<String> {
        self.peers
            .values()
            .map(|entry| entry.display_name.clone())
            .collect()
    }

    /// Iterate over registered peers.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PeerEntry)> {
        self.peers.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_connection() -> Connection {
        // Receiver is kept alive by leaking into the test scope where needed;
        // here the entry only needs to exist in the table.
        let (conn, rx) = Connection::channel(4);
        std::mem::forget(rx);
        conn
    }

    #[test]
    fn test_admit_and_lookup() {
        let mut registry = Registry::new();
        registry
            .admit("peer-1", "Vega".to_string(), test_connection())
            .unwrap();

        assert!(registry.contains("peer-1"));
        assert!(registry.lookup("peer-1").is_some());
        assert_eq!(registry.display_name("peer-1"), Some("Vega"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_admit_rejects_collision() {
        let mut registry = Registry::new();
        registry
            .admit("peer-1", "Vega".to_string(), test_connection())
            .unwrap();

        let result = registry.admit("peer-1", "Altair".to_string(), test_connection());
        assert!(matches!(result, Err(Error::PeerIdTaken(_))));
        // The original mapping is untouched.
        assert_eq!(registry.display_name("peer-1"), Some("Vega"));
    }

    #[test]
    fn test_admit_rejects_empty_id() {
        let mut registry = Registry::new();
        let result = registry.admit("", "Vega".to_string(), test_connection());
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = Registry::new();
        registry
            .admit("peer-1", "Vega".to_string(), test_connection())
            .unwrap();

        assert!(registry.remove("peer-1").is_some());
        assert!(registry.remove("peer-1").is_none());
        assert!(registry.remove("never-existed").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_tracks_admissions_exactly() {
        let mut registry = Registry::new();
        registry
            .admit("peer-1", "Vega".to_string(), test_connection())
            .unwrap();
        registry
            .admit("peer-2", "Altair".to_string(), test_connection())
            .unwrap();
        registry.remove("peer-1");

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].peer_id, "peer-2");
        assert_eq!(snapshot[0].display_name, "Altair");
    }

    #[test]
    fn test_names_in_use() {
        let mut registry = Registry::new();
        registry
            .admit("peer-1", "Vega".to_string(), test_connection())
            .unwrap();
        registry
            .admit("peer-2", "Altair".to_string(), test_connection())
            .unwrap();

        let names = registry.names_in_use();
        assert!(names.contains("Vega"));
        assert!(names.contains("Altair"));

        registry.remove("peer-1");
        assert!(!registry.names_in_use().contains("Vega"));
    }
}
