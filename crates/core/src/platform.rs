//! Cross-platform path helpers.

use std::path::PathBuf;

/// Get the application data directory.
///
/// - Linux: `~/.local/share/driftdrop`
/// - Windows: `%LOCALAPPDATA%\driftdrop`
/// - macOS: `~/Library/Application Support/driftdrop`
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("driftdrop")
}

/// Get the configuration directory.
///
/// - Linux: `~/.config/driftdrop`
/// - Windows: `%APPDATA%\driftdrop`
/// - macOS: `~/Library/Application Support/driftdrop`
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("driftdrop")
}

/// Get the path to the main config file.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.json")
}
