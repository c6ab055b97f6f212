use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::application::services::CancelOutcome;
use crate::domain::Stage;
use crate::presentation::state::AppState;

use super::error::{error_response, parse_job_id, pipeline_error_response};

#[derive(Serialize)]
pub struct CancelResponse {
    pub job_id: String,
    pub outcome: CancelOutcome,
}

#[derive(Debug, Deserialize)]
pub struct ReprocessRequest {
    pub from_stage: String,
}

#[derive(Serialize)]
pub struct ReprocessResponse {
    pub job_id: String,
    pub from_stage: Stage,
    pub message: String,
}

#[tracing::instrument(skip(state))]
pub async fn cancel_handler(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.pipeline.cancel(job_id).await {
        Ok(outcome) => (
            StatusCode::ACCEPTED,
            Json(CancelResponse {
                job_id: job_id.to_string(),
                outcome,
            }),
        )
            .into_response(),
        Err(e) => pipeline_error_response(e),
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn reprocess_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<ReprocessRequest>,
) -> Response {
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let from_stage: Stage = match request.from_stage.parse() {
        Ok(stage) => stage,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    match state.pipeline.reprocess(job_id, from_stage).await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(ReprocessResponse {
                job_id: job_id.to_string(),
                from_stage,
                message: format!("Reprocessing from {}", from_stage),
            }),
        )
            .into_response(),
        Err(e) => pipeline_error_response(e),
    }
}
