use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::{ArtifactKind, Stage};
use crate::presentation::state::AppState;

use super::error::{error_response, parse_job_id, pipeline_error_response};

#[derive(Serialize)]
pub struct DocumentationResponse {
    pub job_id: String,
    pub stage: Stage,
    pub revision: u32,
    pub document: serde_json::Value,
    pub artifacts: BTreeMap<String, String>,
}

/// Returns the generated document and the references of every live artifact.
#[tracing::instrument(skip(state))]
pub async fn documentation_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let record = match state.pipeline.get_record(job_id).await {
        Ok(r) => r,
        Err(e) => return pipeline_error_response(e),
    };
    let artifacts = match state.pipeline.get_artifacts(job_id).await {
        Ok(a) => a,
        Err(e) => return pipeline_error_response(e),
    };

    let Some(document_ref) = artifacts.get(ArtifactKind::Document) else {
        return error_response(
            StatusCode::CONFLICT,
            format!("Documentation for job {} is not generated yet", job_id),
        );
    };

    let document = match state.store.fetch(document_ref.as_str()).await {
        Ok(raw) => match serde_json::from_slice::<serde_json::Value>(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "Stored document is not valid JSON");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Stored document is unreadable");
            }
        },
        Err(e) => {
            tracing::error!(error = %e, document = %document_ref, "Failed to read document");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to read document: {}", e));
        }
    };

    let listing = artifacts
        .iter()
        .map(|(kind, reference)| (kind.to_string(), reference.to_string()))
        .collect();

    (
        StatusCode::OK,
        Json(DocumentationResponse {
            job_id: job_id.to_string(),
            stage: record.stage,
            revision: record.revision,
            document,
            artifacts: listing,
        }),
    )
        .into_response()
}
