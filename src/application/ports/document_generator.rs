use async_trait::async_trait;

use crate::domain::{ArtifactRef, DocumentRequest, JobId, TranscriptSegment};

#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    /// Produces the document content for a job and returns where it was stored.
    async fn generate(
        &self,
        job_id: JobId,
        revision: u32,
        request: &DocumentRequest,
        segments: &[TranscriptSegment],
    ) -> Result<ArtifactRef, GenerationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation failed: {0}")]
    GenerationFailed(String),
    #[error("no transcript content to document")]
    EmptyTranscript,
    #[error("storage failed: {0}")]
    Storage(String),
}
