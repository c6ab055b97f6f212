use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::application::ports::ArtifactStoreError;
use crate::domain::ExportFormat;
use crate::presentation::state::AppState;

use super::error::{error_response, parse_job_id, pipeline_error_response};

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub format: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn download_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let format: ExportFormat = match query.format.as_deref().unwrap_or("pdf").parse() {
        Ok(f) => f,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let artifacts = match state.pipeline.get_artifacts(job_id).await {
        Ok(a) => a,
        Err(e) => return pipeline_error_response(e),
    };

    let Some(reference) = artifacts.export(format) else {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("No {} export for job {}", format, job_id),
        );
    };

    match state.store.fetch(reference.as_str()).await {
        Ok(bytes) => {
            tracing::debug!(format = %format, bytes = bytes.len(), "Serving export");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, format.mime_type().to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!(
                            "attachment; filename=\"{}.{}\"",
                            job_id,
                            format.extension()
                        ),
                    ),
                ],
                Body::from(bytes),
            )
                .into_response()
        }
        Err(ArtifactStoreError::NotFound(path)) => {
            tracing::error!(path = %path, "Export recorded but missing from storage");
            error_response(StatusCode::NOT_FOUND, format!("Export file missing: {}", path))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read export");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to read export: {}", e))
        }
    }
}
