use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    cancel_handler, documentation_handler, download_handler, health_handler, reprocess_handler,
    status_handler, upload_handler,
};
use crate::presentation::state::AppState;

/// Slack for multipart boundaries and the text fields around the file.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let body_limit = usize::try_from(state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))
        .unwrap_or(usize::MAX);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/v1/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/v1/status/{job_id}", get(status_handler))
        .route("/api/v1/documentation/{job_id}", get(documentation_handler))
        .route("/api/v1/download/{job_id}", get(download_handler))
        .route("/api/v1/jobs/{job_id}/cancel", post(cancel_handler))
        .route("/api/v1/jobs/{job_id}/reprocess", post(reprocess_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
