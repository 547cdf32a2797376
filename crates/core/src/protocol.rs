//! Wire protocol between peers and the coordination service.
//!
//! Every frame is a JSON object carrying a `type` discriminator. Both
//! directions are closed tagged unions dispatched through exhaustive
//! matches; unknown types fail to parse and are dropped by the transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One row of a presence list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    /// Opaque client-generated peer id.
    pub peer_id: String,
    /// Display name assigned on admission.
    pub display_name: String,
}

/// A shareable payload: a file held by the content store and referenced by
/// id, or a text note carried inline. Immutable once created; every
/// delivery clones the same envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShareEnvelope {
    File {
        file_id: String,
        filename: String,
        size: u64,
    },
    Text {
        share_id: String,
        title: String,
        content: String,
    },
}

impl ShareEnvelope {
    /// Store identifier for this envelope.
    pub fn id(&self) -> &str {
        match self {
            ShareEnvelope::File { file_id, .. } => file_id,
            ShareEnvelope::Text { share_id, .. } => share_id,
        }
    }

    /// Human-readable label: the filename or the note title.
    pub fn label(&self) -> &str {
        match self {
            ShareEnvelope::File { filename, .. } => filename,
            ShareEnvelope::Text { title, .. } => title,
        }
    }
}

/// Messages a peer sends to the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Fan a share out to a set of recipients.
    ShareNotification {
        to_peer_ids: Vec<String>,
        share: ShareEnvelope,
    },

    /// Ask another peer to open a chat session.
    ChatRequest { to_peer_id: String },

    /// Consent to a pending chat request.
    ChatAccept { to_peer_id: String },

    /// Turn down a pending chat request.
    ChatDecline { to_peer_id: String },

    /// Relay a message within an active chat session.
    PrivateMessage { to_peer_id: String, content: String },
}

/// Messages the service pushes to a peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Identity assignment, sent once right after admission.
    CharacterAssigned {
        peer_id: String,
        display_name: String,
    },

    /// Full replacement presence list; the receiving peer is never included.
    UserListUpdate { users: Vec<PresenceEntry> },

    /// A share delivered to this peer.
    IncomingShare {
        from_peer_id: String,
        from_name: String,
        share: ShareEnvelope,
        timestamp: DateTime<Utc>,
    },

    /// Every recipient of a share was reached.
    ShareSuccess { message: String },

    /// At least one recipient of a share was not reached.
    ShareFailed { message: String },

    /// Another peer wants to chat.
    ChatRequest {
        from_peer_id: String,
        from_name: String,
    },

    /// The chat request was accepted; the session is now active.
    ChatAccept {
        from_peer_id: String,
        from_name: String,
    },

    /// The chat request was declined (or the target was unreachable).
    ChatDecline { from_peer_id: String },

    /// A message relayed within an active chat session.
    PrivateMessage {
        from_peer_id: String,
        content: String,
        timestamp: DateTime<Utc>,
    },
}

impl ClientMessage {
    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerMessage {
    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
