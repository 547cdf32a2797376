//! Content store routes: uploads, text shares, downloads, and liveness.
//!
//! The store enforces its own payload ceiling; these handlers relay its
//! rejection reasons and cap each operation at the configured time ceiling.

use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use driftdrop_core::{Error, Result};

use super::AppState;

/// `GET /api/health`
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "driftdrop" }))
}

/// `GET /api/active-users`
pub async fn active_users(State(state): State<AppState>) -> Json<serde_json::Value> {
    let users = state.hub.snapshot().await;
    Json(json!({ "users": users }))
}

#[derive(Debug, Deserialize)]
pub struct CreateTextShare {
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// `POST /api/create-text-share`
pub async fn create_text_share(
    State(state): State<AppState>,
    Json(req): Json<CreateTextShare>,
) -> Response {
    let result = with_store_timeout(&state, || {
        state.store.put_text(&req.content, req.title.as_deref())
    })
    .await;

    match result {
        Ok(envelope) => Json(envelope).into_response(),
        Err(e) => store_error(e),
    }
}

/// `POST /api/upload` — multipart with a single `file` field.
pub async fn upload_file(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let filename = field.file_name().unwrap_or("unnamed").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = match field.bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(e) => return store_error(Error::Store(e.to_string())),
                };
                debug!(filename = %filename, size = data.len(), "upload received");

                let result = with_store_timeout(&state, || {
                    state
                        .store
                        .put_file(data, &filename, content_type.as_deref())
                })
                .await;
                return match result {
                    Ok(envelope) => Json(envelope).into_response(),
                    Err(e) => store_error(e),
                };
            }
            Ok(None) => break,
            Err(e) => return store_error(Error::Store(e.to_string())),
        }
    }

    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "no file field in upload" })),
    )
        .into_response()
}

/// `GET /api/download/:id`
pub async fn download(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = with_store_timeout(&state, || state.store.get(&id)).await;

    match result {
        Ok(content) => {
            let content_type = content
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let filename = content.filename.unwrap_or_else(|| "download".to_string());
            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                content.data,
            )
                .into_response()
        }
        Err(e) => store_error(e),
    }
}

/// Cap a store operation at the configured ceiling. A timeout surfaces as a
/// descriptive failure to the caller and is never retried here.
async fn with_store_timeout<T>(
    state: &AppState,
    op: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let ceiling = Duration::from_secs(state.config.store_op_timeout_secs);
    match tokio::time::timeout(ceiling, async move { op() }).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "store operation exceeded {}s",
            state.config.store_op_timeout_secs
        ))),
    }
}

fn store_error(err: Error) -> Response {
    let status = match &err {
        Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        Error::ContentNotFound(_) => StatusCode::NOT_FOUND,
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
