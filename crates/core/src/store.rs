//! Content store boundary.
//!
//! The coordination layer never moves payload bytes between peers; it hands
//! them to a store, gets back an opaque identifier wrapped in a
//! [`ShareEnvelope`], and later resolves identifiers for download. The
//! store enforces its own ceilings and the coordination layer only relays
//! rejection reasons.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::config::{MAX_PAYLOAD_BYTES, SHARE_RETENTION_HOURS};
use crate::error::{Error, Result};
use crate::protocol::ShareEnvelope;

/// Title used when a text share arrives without one.
const DEFAULT_TEXT_TITLE: &str = "Shared Note";

/// Resolved content returned by [`ContentStore::get`].
#[derive(Debug, Clone)]
pub struct StoredContent {
    pub data: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// What the coordination layer needs from a content store.
pub trait ContentStore: Send + Sync {
    /// Accept a binary blob; returns the envelope describing it.
    fn put_file(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<ShareEnvelope>;

    /// Accept a text note; returns the envelope describing it.
    fn put_text(&self, content: &str, title: Option<&str>) -> Result<ShareEnvelope>;

    /// Resolve an identifier back to bytes.
    fn get(&self, id: &str) -> Result<StoredContent>;
}

struct StoreEntry {
    data: Vec<u8>,
    filename: Option<String>,
    content_type: Option<String>,
    expires_at: DateTime<Utc>,
}

/// In-memory store with the boundary ceilings: 100 MiB per payload and
/// 24 h retention by default. Expired entries are swept lazily on access.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, StoreEntry>>,
    max_payload_bytes: u64,
    retention: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_limits(MAX_PAYLOAD_BYTES, Duration::hours(SHARE_RETENTION_HOURS))
    }

    pub fn with_limits(max_payload_bytes: u64, retention: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_payload_bytes,
            retention,
        }
    }

    /// Build a store from service configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::with_limits(
            config.max_payload_bytes,
            Duration::hours(config.share_retention_hours),
        )
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.max_payload_bytes {
            return Err(Error::PayloadTooLarge {
                size,
                limit: self.max_payload_bytes,
            });
        }
        Ok(())
    }

    fn purge_expired(entries: &mut HashMap<String, StoreEntry>) {
        let now = Utc::now();
        entries.retain(|_, entry| entry.expires_at > now);
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoreEntry>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Store("store lock poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for MemoryStore {
    fn put_file(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<ShareEnvelope> {
        let size = data.len() as u64;
        self.check_size(size)?;

        let file_id = Uuid::new_v4().to_string();
        let mut entries = self.lock()?;
        Self::purge_expired(&mut entries);
        entries.insert(
            file_id.clone(),
            StoreEntry {
                data,
                filename: Some(filename.to_string()),
                content_type: content_type.map(str::to_string),
                expires_at: Utc::now() + self.retention,
            },
        );

        Ok(ShareEnvelope::File {
            file_id,
            filename: filename.to_string(),
            size,
        })
    }

    fn put_text(&self, content: &str, title: Option<&str>) -> Result<ShareEnvelope> {
        self.check_size(content.len() as u64)?;

        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TEXT_TITLE);
        let share_id = Uuid::new_v4().to_string();

        let mut entries = self.lock()?;
        Self::purge_expired(&mut entries);
        entries.insert(
            share_id.clone(),
            StoreEntry {
                data: content.as_bytes().to_vec(),
                filename: None,
                content_type: Some("text/plain; charset=utf-8".to_string()),
                expires_at: Utc::now() + self.retention,
            },
        );

        Ok(ShareEnvelope::Text {
            share_id,
            title: title.to_string(),
            content: content.to_string(),
        })
    }

    fn get(&self, id: &str) -> Result<StoredContent> {
        let mut entries = self.lock()?;
        Self::purge_expired(&mut entries);
        entries
            .get(id)
            .map(|entry| StoredContent {
                data: entry.data.clone(),
                filename: entry.filename.clone(),
                content_type: entry.content_type.clone(),
            })
            .ok_or_else(|| Error::ContentNotFound(id.to_string()))
    }
}
