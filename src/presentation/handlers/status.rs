use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::presentation::state::AppState;

use super::error::{parse_job_id, pipeline_error_response};

#[tracing::instrument(skip(state))]
pub async fn status_handler(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.pipeline.get_status(job_id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => pipeline_error_response(e),
    }
}
