//! Chat session negotiation: a consent handshake per unordered peer pair.
//!
//! A one-sided "I want to chat" signal becomes a mutually-accepted session
//! before any message relays. At most one session exists per pair at any
//! time; absence from the table is the NONE state. The table is pure state
//! machine — the hub owns it, serializes access, and turns transition
//! outcomes into wire messages.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;

/// Unordered pair of peer ids, normalized so `(a, b)` and `(b, a)` collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }

    /// Whether `peer_id` is one of the two ends.
    pub fn involves(&self, peer_id: &str) -> bool {
        self.0 == peer_id || self.1 == peer_id
    }
}

/// Negotiation state for one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// One side has asked; `requester` owns the pending request.
    Pending { requester: String },
    /// Both sides consented; private messages relay.
    Active,
}

/// Result of a request transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Fresh PENDING: deliver a `chat_request` to the target.
    Deliver,
    /// The pair is already pending: idempotent retry, deliver nothing.
    /// A crossing request from the counterparty lands here too, so
    /// simultaneous requests resolve to exactly one pending owner.
    AlreadyPending,
    /// The session is already active: nothing left to negotiate.
    AlreadyActive,
}

/// All chat sessions, keyed by unordered peer pair.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<PairKey, SessionState>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `from` asks `to` for a session.
    pub fn request(&mut self, from: &str, to: &str) -> RequestOutcome {
        match self.sessions.entry(PairKey::new(from, to)) {
            Entry::Occupied(entry) => match entry.get() {
                SessionState::Pending { .. } => RequestOutcome::AlreadyPending,
                SessionState::Active => RequestOutcome::AlreadyActive,
            },
            Entry::Vacant(entry) => {
                entry.insert(SessionState::Pending {
                    requester: from.to_string(),
                });
                RequestOutcome::Deliver
            }
        }
    }

    /// `by` accepts the request `with` made.
    ///
    /// Only the original target of a pending request may accept; any other
    /// transition returns false and changes nothing.
    pub fn accept(&mut self, by: &str, with: &str) -> bool {
        match self.sessions.entry(PairKey::new(by, with)) {
            Entry::Occupied(mut entry) => {
                let valid = matches!(
                    entry.get(),
                    SessionState::Pending { requester } if requester == with
                );
                if valid {
                    entry.insert(SessionState::Active);
                }
                valid
            }
            Entry::Vacant(_) => false,
        }
    }

    /// `by` declines the request `with` made. Same validity rule as accept.
    pub fn decline(&mut self, by: &str, with: &str) -> bool {
        match self.sessions.entry(PairKey::new(by, with)) {
            Entry::Occupied(entry) => {
                let valid = matches!(
                    entry.get(),
                    SessionState::Pending { requester } if requester == with
                );
                if valid {
                    entry.remove();
                }
                valid
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Whether the pair has an active session. Gates private-message relay.
    pub fn is_active(&self, a: &str, b: &str) -> bool {
        matches!(
            self.sessions.get(&PairKey::new(a, b)),
            Some(SessionState::Active)
        )
    }

    /// Current state for a pair; `None` means NONE.
    pub fn state(&self, a: &str, b: &str) -> Option<&SessionState> {
        self.sessions.get(&PairKey::new(a, b))
    }

    /// Force every session involving `peer_id` back to NONE, without
    /// notifying the other side. Returns how many were closed.
    pub fn drop_peer(&mut self, peer_id: &str) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|key, _| !key.involves(peer_id));
        let closed = before - self.sessions.len();
        if closed > 0 {
            debug!(peer_id, closed, "chat sessions closed on disconnect");
        }
        closed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
