use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use crate::application::ports::{ArtifactStore, Transcriber, TranscriptionError};
use crate::domain::{MediaRef, TranscribedSpan};

#[derive(Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Speech-to-text through the OpenAI audio transcription endpoint, asking for
/// `verbose_json` so each segment keeps its timestamps.
pub struct OpenAiWhisperTranscriber {
    client: reqwest::Client,
    store: Arc<dyn ArtifactStore>,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiWhisperTranscriber {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            store,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "whisper-1".to_string()),
        }
    }
}

fn mime_for(extension: Option<&str>) -> &'static str {
    match extension {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

fn into_spans(response: VerboseTranscription) -> Vec<TranscribedSpan> {
    let spans: Vec<TranscribedSpan> = response
        .segments
        .into_iter()
        .filter(|s| !s.text.trim().is_empty())
        .map(|s| TranscribedSpan::new(s.text.trim(), s.start, s.end))
        .collect();

    if spans.is_empty() && !response.text.trim().is_empty() {
        let end = response.duration.unwrap_or(0.0);
        return vec![TranscribedSpan::new(response.text.trim(), 0.0, end)];
    }
    spans
}

#[async_trait]
impl Transcriber for OpenAiWhisperTranscriber {
    #[tracing::instrument(skip(self), fields(media = %media, model = %self.model))]
    async fn transcribe(&self, media: &MediaRef) -> Result<Vec<TranscribedSpan>, TranscriptionError> {
        let audio_data = self
            .store
            .fetch(media.as_str())
            .await
            .map_err(|e| TranscriptionError::MediaUnavailable(e.to_string()))?;

        let url = format!("{}/audio/transcriptions", self.base_url);
        let extension = media.extension();

        let file_part = multipart::Part::bytes(audio_data)
            .file_name(media.filename().to_string())
            .mime_str(mime_for(extension.as_deref()))
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("mime: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .part("file", file_part);

        tracing::debug!("Sending media to OpenAI Whisper API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            if status == reqwest::StatusCode::BAD_REQUEST {
                return Err(TranscriptionError::UnsupportedFormat(body));
            }
            return Err(TranscriptionError::ApiRequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let transcription: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| TranscriptionError::InvalidResponse(e.to_string()))?;

        let spans = into_spans(transcription);
        tracing::info!(segments = spans.len(), "OpenAI Whisper transcription completed");

        Ok(spans)
    }
}

