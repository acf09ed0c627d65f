use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use sieve_core::{Config, OrchestratorError};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build an error body with the given status.
pub fn error_response(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map an orchestrator error to its HTTP status.
pub fn orchestrator_error(err: OrchestratorError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        OrchestratorError::AlreadyActive(_) => StatusCode::CONFLICT,
        OrchestratorError::NotFound(_) => StatusCode::NOT_FOUND,
        OrchestratorError::Validation(_) => StatusCode::BAD_REQUEST,
        OrchestratorError::AtCapacity(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(status, err.to_string())
}

#[derive(Serialize)]
pub struct RootResponse {
    pub name: &'static str,
    pub version: &'static str,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        name: "sieve",
        version: VERSION,
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub active_tasks: usize,
    pub active_connections: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        active_tasks: state.orchestrator().active_ids().await.len(),
        active_connections: state.hub().subscriber_count().await,
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
