use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::application::services::PipelineError;
use crate::domain::JobId;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

pub fn pipeline_error_response(e: PipelineError) -> Response {
    let status = match &e {
        PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::InvalidStage(_) => StatusCode::BAD_REQUEST,
        PipelineError::NotReady { .. }
        | PipelineError::AlreadyTerminal(_)
        | PipelineError::NotCancellable { .. }
        | PipelineError::StillActive(_)
        | PipelineError::Conflict(_) => StatusCode::CONFLICT,
        PipelineError::Repository(_) => {
            tracing::error!(error = %e, "Pipeline request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, e.to_string())
}

pub fn parse_job_id(raw: &str) -> Result<JobId, Response> {
    Uuid::parse_str(raw)
        .map(JobId::from_uuid)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, format!("Invalid job ID: {}", raw)))
}
