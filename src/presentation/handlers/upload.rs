use std::io;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{DocumentLevel, DocumentRequest, DocumentType, ExportFormat, MediaRef};
use crate::infrastructure::media::{MediaValidator, SUPPORTED_EXTENSIONS};
use crate::presentation::state::AppState;

use super::error::{error_response, pipeline_error_response};

#[derive(Serialize)]
pub struct UploadResponse {
    pub job_id: String,
    pub status_url: String,
    pub message: String,
}

/// Form fields other than the file, collected in any order.
#[derive(Default)]
struct UploadForm {
    media: Option<MediaRef>,
    doc_type: DocumentType,
    doc_level: DocumentLevel,
    formats: Vec<ExportFormat>,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn upload_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match read_form(&state, multipart).await {
        Ok(form) => form,
        Err((response, stored)) => {
            if let Some(media) = stored
                && let Err(e) = state.store.delete(media.as_str()).await
            {
                tracing::warn!(media = %media, error = %e, "Failed to discard rejected upload");
            }
            return response;
        }
    };

    let Some(media) = form.media else {
        tracing::warn!("Upload request with no file");
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    let request = DocumentRequest::new(form.doc_type, form.doc_level, form.formats);
    match state.pipeline.submit(media.clone(), request).await {
        Ok(job_id) => {
            tracing::info!(job_id = %job_id, media = %media, "Upload accepted");
            (
                StatusCode::ACCEPTED,
                Json(UploadResponse {
                    job_id: job_id.to_string(),
                    status_url: format!("/api/v1/status/{}", job_id),
                    message: "File uploaded, processing started".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => pipeline_error_response(e),
    }
}

async fn read_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<UploadForm, (Response, Option<MediaRef>)> {
    let mut form = UploadForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read multipart");
                return Err((
                    error_response(StatusCode::BAD_REQUEST, format!("Failed to read multipart: {}", e)),
                    form.media,
                ));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if form.media.is_some() {
                    return Err((
                        error_response(StatusCode::BAD_REQUEST, "Only one file per upload"),
                        form.media,
                    ));
                }
                let filename = field.file_name().unwrap_or("upload").to_string();
                let media = MediaRef::new(Uuid::new_v4(), &filename);

                let supported = media
                    .extension()
                    .is_some_and(|ext| MediaValidator::is_supported_extension(&ext));
                if !supported {
                    tracing::warn!(filename = %filename, "Unsupported media type");
                    return Err((
                        error_response(
                            StatusCode::UNSUPPORTED_MEDIA_TYPE,
                            format!(
                                "Unsupported file type: {}. Supported: {}",
                                filename,
                                SUPPORTED_EXTENSIONS.join(", ")
                            ),
                        ),
                        None,
                    ));
                }

                let stream = field.map(|chunk| chunk.map_err(io::Error::other)).boxed();
                match state.store.store(media.as_str(), stream, None).await {
                    Ok(bytes) => {
                        tracing::debug!(media = %media, bytes, "Upload stored");
                        if bytes > state.max_upload_bytes {
                            return Err((
                                error_response(
                                    StatusCode::PAYLOAD_TOO_LARGE,
                                    format!("File exceeds {} bytes", state.max_upload_bytes),
                                ),
                                Some(media),
                            ));
                        }
                        form.media = Some(media);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to store upload");
                        return Err((
                            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to store file: {}", e)),
                            None,
                        ));
                    }
                }
            }
            "doc_type" | "doc_level" | "formats" => {
                let value = match field.text().await {
                    Ok(v) => v,
                    Err(e) => {
                        return Err((
                            error_response(StatusCode::BAD_REQUEST, format!("Failed to read {}: {}", name, e)),
                            form.media,
                        ));
                    }
                };
                if let Err(message) = apply_text_field(&mut form, &name, &value) {
                    return Err((error_response(StatusCode::BAD_REQUEST, message), form.media));
                }
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown form field");
            }
        }
    }

    Ok(form)
}

fn apply_text_field(form: &mut UploadForm, name: &str, value: &str) -> Result<(), String> {
    match name {
        "doc_type" => form.doc_type = value.parse()?,
        "doc_level" => form.doc_level = value.parse()?,
        _ => {
            for raw in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                form.formats.push(raw.parse()?);
            }
        }
    }
    Ok(())
}
