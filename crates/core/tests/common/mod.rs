//! Common test utilities for integration tests.

use std::time::Duration;

use driftdrop_core::{Connection, Hub, ServerMessage};
use tokio::sync::mpsc;

/// Default timeout for test operations.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Initialize test logging with appropriate filters.
///
/// Safe to call multiple times (subsequent calls are no-ops).
#[allow(dead_code)]
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("driftdrop_core=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Run an async operation with a timeout.
#[allow(dead_code)]
pub async fn with_timeout<T, F>(fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, fut)
        .await
        .expect("test operation timed out")
}

/// Admit a peer into the hub over an in-process connection.
pub async fn admit(hub: &Hub, peer_id: &str) -> (String, mpsc::Receiver<ServerMessage>) {
    let (connection, rx) = Connection::channel(32);
    let display_name = hub
        .admit(peer_id, connection)
        .await
        .expect("admission failed");
    (display_name, rx)
}

/// Pull everything currently queued for a peer.
pub fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}
