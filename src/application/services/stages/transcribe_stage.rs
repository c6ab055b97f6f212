use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::application::ports::{ArtifactStore, Transcriber};
use crate::application::services::{StageError, StageExecutor, StageOutput};
use crate::domain::{ArtifactKind, ArtifactRef, JobRecord};

/// Transcribes the source media and persists the spans as a JSON transcript.
pub struct TranscribeStage {
    transcriber: Arc<dyn Transcriber>,
    store: Arc<dyn ArtifactStore>,
}

impl TranscribeStage {
    pub fn new(transcriber: Arc<dyn Transcriber>, store: Arc<dyn ArtifactStore>) -> Self {
        Self { transcriber, store }
    }
}

#[async_trait]
impl StageExecutor for TranscribeStage {
    async fn execute(&self, record: &JobRecord) -> Result<StageOutput, StageError> {
        let spans = self.transcriber.transcribe(&record.source).await?;
        if spans.is_empty() {
            return Err(StageError::validation("transcription produced no speech"));
        }

        let body = serde_json::to_vec(&spans)
            .map_err(|e| StageError::integrity(format!("transcript encoding: {}", e)))?;
        let path = format!(
            "transcripts/{}/r{}/transcript.json",
            record.id.as_uuid(),
            record.revision
        );
        self.store.put(&path, Bytes::from(body)).await?;

        tracing::info!(job_id = %record.id, segments = spans.len(), "Transcript stored");

        Ok(StageOutput::empty().with_artifact(ArtifactKind::Transcript, ArtifactRef::new(path)))
    }
}
