use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, tasks, upload, ws};
use crate::state::AppState;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config().upload.max_file_size_bytes + MULTIPART_OVERHEAD;

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Upload
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        // Tasks
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks/{id}", delete(tasks::cancel_task))
        .route("/tasks/{id}/result", get(tasks::get_result))
        .route("/tasks/{id}/data", get(tasks::get_data))
        .route("/tasks/{id}/debug", get(tasks::get_debug))
        // Live progress
        .route("/ws/{id}", get(ws::ws_handler))
        .with_state(Arc::clone(&state));

    Router::new()
        .route("/", get(handlers::root))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
