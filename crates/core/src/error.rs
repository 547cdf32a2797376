//! Error types for the coordination core.

use thiserror::Error;

/// Main error type for the coordination core.
///
/// No variant here is fatal to the service process: every failure is scoped
/// to a single request or a single connection.
#[derive(Error, Debug)]
pub enum Error {
    /// Request failed validation before touching any state
    #[error("validation error: {0}")]
    Validation(String),

    /// Target peer is not currently registered
    #[error("peer not found: {0}")]
    PeerNotFound(String),

    /// Peer id is already present in the registry
    #[error("peer id already registered: {0}")]
    PeerIdTaken(String),

    /// Send to a dead or hopelessly backlogged connection
    #[error("transport error: {0}")]
    Transport(String),

    /// Payload exceeds the content store ceiling
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// Stored content id did not resolve
    #[error("content not found: {0}")]
    ContentNotFound(String),

    /// Operation exceeded its time ceiling
    #[error("timed out: {0}")]
    Timeout(String),

    /// Content store failure
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// WebSocket error (peer-side client)
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(err.to_string())
    }
}
