//! Configuration management for the coordination service and peer client.

use crate::error::Result;
use crate::platform;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum payload the content store accepts, in bytes (100 MiB).
pub const MAX_PAYLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Ceiling on a single content store operation, in seconds.
pub const STORE_OP_TIMEOUT_SECS: u64 = 35;

/// How long stored shares stay resolvable, in hours.
pub const SHARE_RETENTION_HOURS: i64 = 24;

/// Fixed delay between reconnection attempts, in milliseconds.
pub const RECONNECT_DELAY_MS: u64 = 3000;

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the daemon binds, e.g. `0.0.0.0:8001`.
    pub bind_addr: String,

    /// Largest payload the content store accepts, in bytes.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: u64,

    /// Ceiling on a single content store operation, in seconds.
    #[serde(default = "default_store_op_timeout_secs")]
    pub store_op_timeout_secs: u64,

    /// How long stored shares stay resolvable, in hours.
    #[serde(default = "default_share_retention_hours")]
    pub share_retention_hours: i64,

    /// Fixed delay between peer reconnection attempts, in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_max_payload_bytes() -> u64 {
    MAX_PAYLOAD_BYTES
}

fn default_store_op_timeout_secs() -> u64 {
    STORE_OP_TIMEOUT_SECS
}

fn default_share_retention_hours() -> i64 {
    SHARE_RETENTION_HOURS
}

fn default_reconnect_delay_ms() -> u64 {
    RECONNECT_DELAY_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8001".to_string(),
            max_payload_bytes: MAX_PAYLOAD_BYTES,
            store_op_timeout_secs: STORE_OP_TIMEOUT_SECS,
            share_retention_hours: SHARE_RETENTION_HOURS,
            reconnect_delay_ms: RECONNECT_DELAY_MS,
        }
    }
}

impl Config {
    /// Load configuration from the default config file.
    pub fn load() -> Result<Self> {
        let config_path = platform::config_file_path();

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<()> {
        self.save_to_file(&platform::config_file_path())
    }

    /// Save configuration to a specific file.
    fn save_to_file(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Load configuration from environment variables, falling back to file/defaults.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;

        if let Ok(addr) = std::env::var("DRIFTDROP_BIND_ADDR") {
            config.bind_addr = addr;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_spec_constants() {
        let config = Config::default();
        assert_eq!(config.max_payload_bytes, 100 * 1024 * 1024);
        assert_eq!(config.store_op_timeout_secs, 35);
        assert_eq!(config.share_retention_hours, 24);
        assert_eq!(config.reconnect_delay_ms, 3000);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{ "bind_addr": "127.0.0.1:9000" }"#).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.max_payload_bytes, MAX_PAYLOAD_BYTES);
        assert_eq!(config.reconnect_delay_ms, RECONNECT_DELAY_MS);
    }

    #[test]
    fn test_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.bind_addr, config.bind_addr);
        assert_eq!(parsed.max_payload_bytes, config.max_payload_bytes);
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let mut config = Config::default();
        config.bind_addr = "127.0.0.1:9001".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.bind_addr, "127.0.0.1:9001");
        assert_eq!(loaded.store_op_timeout_secs, STORE_OP_TIMEOUT_SECS);
    }
}
