use async_trait::async_trait;

use crate::domain::{MediaRef, TranscribedSpan};

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, media: &MediaRef) -> Result<Vec<TranscribedSpan>, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("media read failed: {0}")]
    MediaUnavailable(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("invalid transcription response: {0}")]
    InvalidResponse(String),
}
