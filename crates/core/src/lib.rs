//! driftdrop coordination core.
//!
//! This crate provides the realtime coordination layer for driftdrop:
//! - Connection registry and presence propagation
//! - Share fan-out with per-recipient outcomes
//! - Consent-gated chat session negotiation
//! - The content-store boundary and an in-memory store
//! - The peer-side reconnecting client
//!
//! It is used by the daemon crate and by embedding peers. All coordination
//! state is in-memory and scoped to the process lifetime.

pub mod chat;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod hub;
pub mod identity;
pub mod platform;
pub mod presence;
pub mod protocol;
pub mod registry;
pub mod share;
pub mod store;

// Re-export commonly used types
pub use chat::{RequestOutcome, SessionState, SessionTable};
pub use client::{fresh_peer_id, ClientEvent, PeerClient};
pub use config::Config;
pub use connection::Connection;
pub use error::{Error, Result};
pub use hub::Hub;
pub use protocol::{ClientMessage, PresenceEntry, ServerMessage, ShareEnvelope};
pub use share::{DeliveryOutcome, ShareReport, ShareRequest};
pub use store::{ContentStore, MemoryStore, StoredContent};
