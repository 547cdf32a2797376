//! HTTP and WebSocket handlers for the coordination service.

pub mod content;
pub mod ws;

use std::sync::Arc;

use driftdrop_core::{Config, ContentStore, Hub};

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
    pub store: Arc<dyn ContentStore>,
    pub config: Arc<Config>,
}
