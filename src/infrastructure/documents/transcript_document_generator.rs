use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::application::ports::{ArtifactStore, DocumentGenerator, GenerationError};
use crate::domain::{ArtifactRef, DocumentRequest, JobId, TranscriptSegment};

use super::DocumentContent;

/// Builds a [`DocumentContent`] from the retrieved segments and stores it as
/// JSON under `documents/{job}/r{revision}/document.json`.
pub struct TranscriptDocumentGenerator {
    store: Arc<dyn ArtifactStore>,
}

impl TranscriptDocumentGenerator {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DocumentGenerator for TranscriptDocumentGenerator {
    #[tracing::instrument(skip(self, request, segments), fields(job_id = %job_id, segments = segments.len()))]
    async fn generate(
        &self,
        job_id: JobId,
        revision: u32,
        request: &DocumentRequest,
        segments: &[TranscriptSegment],
    ) -> Result<ArtifactRef, GenerationError> {
        if segments.iter().all(|s| s.text.trim().is_empty()) {
            return Err(GenerationError::EmptyTranscript);
        }

        let content = DocumentContent::assemble(job_id, revision, request, segments);
        let body = serde_json::to_vec_pretty(&content)
            .map_err(|e| GenerationError::GenerationFailed(e.to_string()))?;

        let path = format!("documents/{}/r{}/document.json", job_id.as_uuid(), revision);
        self.store
            .put(&path, Bytes::from(body))
            .await
            .map_err(|e| GenerationError::Storage(e.to_string()))?;

        tracing::debug!(path = %path, sections = content.sections.len(), "Document stored");
        Ok(ArtifactRef::new(path))
    }
}
