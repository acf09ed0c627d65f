//! Task API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use sieve_core::{TabularData, TaskResult, Value};

use super::handlers::{error_response, orchestrator_error, ErrorResponse};
use crate::state::AppState;

/// Sample values shown per column on the data endpoint.
const SAMPLE_ROWS: usize = 3;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    pub active_tasks: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub task_id: String,
    pub message: String,
}

/// One column of a cleaned table.
#[derive(Debug, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sample_values: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct DataInfoResponse {
    pub task_id: String,
    pub columns: Vec<ColumnInfo>,
    /// `[rows, columns]`
    pub shape: (usize, usize),
    pub processing_result: TaskResult,
}

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub task_id: String,
    pub active: bool,
    pub has_result: bool,
    pub has_data: bool,
    pub subscribed: bool,
    pub queued_events: usize,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<ListTasksResponse> {
    Json(ListTasksResponse {
        active_tasks: state.orchestrator().active_ids().await,
    })
}

pub async fn cancel_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, (StatusCode, Json<ErrorResponse>)> {
    state
        .orchestrator()
        .cancel(&id)
        .await
        .map_err(orchestrator_error)?;

    info!("Task {} cancelled via API", id);
    Ok(Json(CancelResponse {
        task_id: id,
        message: "Task cancelled".to_string(),
    }))
}

pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResult>, (StatusCode, Json<ErrorResponse>)> {
    match state.orchestrator().result(&id).await {
        Some(result) => Ok(Json(result.as_ref().clone())),
        None => Err(error_response(
            StatusCode::NOT_FOUND,
            "Task not found or still processing",
        )),
    }
}

pub async fn get_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataInfoResponse>, (StatusCode, Json<ErrorResponse>)> {
    let orchestrator = state.orchestrator();
    let Some(result) = orchestrator.result(&id).await else {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            "Task not found or still processing",
        ));
    };
    if !result.success {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Processing failed: {}", result.summary),
        ));
    }
    let Some(table) = orchestrator.processed_table(&id).await else {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            "Processed data not available",
        ));
    };

    let columns = table
        .head(SAMPLE_ROWS)
        .into_iter()
        .map(|(name, sample_values)| {
            let kind = table
                .column_kind(&name)
                .map(|kind| kind.to_string())
                .unwrap_or_default();
            ColumnInfo {
                name,
                kind,
                sample_values,
            }
        })
        .collect();

    Ok(Json(DataInfoResponse {
        task_id: id,
        columns,
        shape: table.shape(),
        processing_result: result.as_ref().clone(),
    }))
}

pub async fn get_debug(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<DebugResponse> {
    let orchestrator = state.orchestrator();
    let hub = state.hub();
    Json(DebugResponse {
        active: orchestrator.is_active(&id).await,
        has_result: orchestrator.result(&id).await.is_some(),
        has_data: orchestrator.processed_table(&id).await.is_some(),
        subscribed: hub.is_subscribed(&id).await,
        queued_events: hub.queued_len(&id).await,
        task_id: id,
    })
}
