use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{ArtifactStore, Embedder, TranscriptIndex};
use crate::application::services::{StageError, StageExecutor, StageOutput};
use crate::domain::{
    ArtifactKind, ArtifactRef, JobRecord, Stage, TranscribedSpan, TranscriptSegment,
};

/// Embeds every transcript span and appends the segments to the index.
pub struct IndexStage {
    store: Arc<dyn ArtifactStore>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn TranscriptIndex>,
}

impl IndexStage {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn TranscriptIndex>,
    ) -> Self {
        Self {
            store,
            embedder,
            index,
        }
    }

    fn index_ref(record: &JobRecord) -> ArtifactRef {
        ArtifactRef::new(format!("index/{}/r{}", record.id.as_uuid(), record.revision))
    }
}

#[async_trait]
impl StageExecutor for IndexStage {
    async fn execute(&self, record: &JobRecord) -> Result<StageOutput, StageError> {
        // A previous attempt of this revision may have committed the index and
        // then lost the race against the stage timeout.
        if record.attempts_for(Stage::Indexing) > 1
            && self.index.live_revision(record.id).await? == Some(record.revision)
        {
            tracing::info!(
                job_id = %record.id,
                revision = record.revision,
                "Index committed by an earlier attempt"
            );
            return Ok(StageOutput::empty()
                .with_artifact(ArtifactKind::TranscriptIndex, Self::index_ref(record)));
        }

        let transcript = record
            .artifacts
            .get(ArtifactKind::Transcript)
            .ok_or_else(|| StageError::integrity("transcript artifact missing"))?;
        let raw = self.store.fetch(transcript.as_str()).await?;
        let spans: Vec<TranscribedSpan> = serde_json::from_slice(&raw)
            .map_err(|e| StageError::integrity(format!("transcript unreadable: {}", e)))?;

        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != spans.len() {
            return Err(StageError::transient(format!(
                "embedder returned {} vectors for {} segments",
                embeddings.len(),
                spans.len()
            )));
        }

        let segments: Vec<TranscriptSegment> = spans
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (span, embedding))| TranscriptSegment::from_span(i as u32, span, embedding))
            .collect();

        let count = self
            .index
            .append(record.id, record.revision, segments)
            .await?;
        tracing::info!(job_id = %record.id, segments = count, "Transcript indexed");

        Ok(StageOutput::empty().with_artifact(ArtifactKind::TranscriptIndex, Self::index_ref(record)))
    }
}
