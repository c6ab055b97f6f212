use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{DocumentGenerator, Embedder, TranscriptIndex};
use crate::application::services::{StageError, StageExecutor, StageOutput};
use crate::domain::{ArtifactKind, JobRecord, TranscriptSegment};

/// Retrieves the segments relevant to each section of the requested document
/// type and hands them, in transcript order, to the document generator.
pub struct GenerateStage {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn TranscriptIndex>,
    generator: Arc<dyn DocumentGenerator>,
    top_k: usize,
}

impl GenerateStage {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn TranscriptIndex>,
        generator: Arc<dyn DocumentGenerator>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            top_k,
        }
    }
}

#[async_trait]
impl StageExecutor for GenerateStage {
    async fn execute(&self, record: &JobRecord) -> Result<StageOutput, StageError> {
        let request = &record.request;
        let sections = request.doc_type.sections();
        let k = self.top_k * request.doc_level.depth_factor();

        let topics = self.embedder.embed_batch(sections).await?;

        let mut selected: BTreeMap<u32, TranscriptSegment> = BTreeMap::new();
        for (section, topic) in sections.iter().zip(topics.iter()) {
            let hits = self.index.query(record.id, topic, k).await?;
            tracing::debug!(job_id = %record.id, section = %section, hits = hits.len(), "Section retrieval");
            for hit in hits {
                selected.entry(hit.segment.sequence).or_insert(hit.segment);
            }
        }

        let segments: Vec<TranscriptSegment> = if selected.is_empty() {
            self.index.segments(record.id).await?
        } else {
            selected.into_values().collect()
        };

        let document = self
            .generator
            .generate(record.id, record.revision, request, &segments)
            .await?;

        tracing::info!(
            job_id = %record.id,
            doc_type = %request.doc_type,
            segments = segments.len(),
            document = %document,
            "Document generated"
        );

        Ok(StageOutput::empty().with_artifact(ArtifactKind::Document, document))
    }
}
