//! Upload handler.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::handlers::{error_response, orchestrator_error, ErrorResponse};
use crate::metrics::UPLOADS_REJECTED;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub task_id: String,
    pub message: String,
    pub filename: String,
    pub file_size: usize,
}

type UploadError = (StatusCode, Json<ErrorResponse>);

fn rejected(reason: &str, message: &str) -> UploadError {
    UPLOADS_REJECTED.with_label_values(&[reason]).inc();
    error_response(StatusCode::BAD_REQUEST, message)
}

fn read_error(e: MultipartError) -> UploadError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return rejected("too_large", "File too large");
    }
    warn!("Failed to read upload: {}", e);
    rejected("malformed", &format!("Failed to read file: {}", e))
}

/// Accept a CSV upload and start cleaning it in the background.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, UploadError> {
    let limits = &state.config().upload;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if !limits.accepts_filename(&filename) {
            return Err(rejected("extension", "Only CSV files are supported"));
        }
        let bytes = field.bytes().await.map_err(read_error)?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let Some((filename, payload)) = upload else {
        return Err(rejected("malformed", "Missing file field"));
    };
    if payload.is_empty() {
        return Err(rejected("empty", "File is empty"));
    }
    if payload.len() > limits.max_file_size_bytes {
        return Err(rejected("too_large", "File too large"));
    }

    let task_id = Uuid::new_v4().to_string();
    let file_size = payload.len();
    state
        .orchestrator()
        .start(&task_id, payload)
        .await
        .map_err(orchestrator_error)?;

    info!("Upload {} ({} bytes) queued as task {}", filename, file_size, task_id);
    Ok(Json(UploadResponse {
        task_id,
        message: "Processing started".to_string(),
        filename,
        file_size,
    }))
}
