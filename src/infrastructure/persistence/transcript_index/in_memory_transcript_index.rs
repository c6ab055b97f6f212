use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::instrument;

use crate::application::ports::{DistanceMetric, TranscriptIndex, TranscriptIndexError};
use crate::domain::{Embedding, JobId, ScoredSegment, TranscriptSegment};

use super::ranking::{check_query, check_segments, rank};

struct Generation {
    revision: u32,
    segments: Vec<TranscriptSegment>,
}

/// Process-local index. The live generation is keyed by job; retired
/// generations are kept for inspection and never queried.
pub struct InMemoryTranscriptIndex {
    dimension: usize,
    metric: DistanceMetric,
    live: DashMap<JobId, Generation>,
    retired: DashMap<JobId, Vec<Generation>>,
}

impl InMemoryTranscriptIndex {
    pub fn new(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            dimension,
            metric,
            live: DashMap::new(),
            retired: DashMap::new(),
        }
    }

    pub fn retired_generations(&self, job_id: JobId) -> usize {
        self.retired.get(&job_id).map(|g| g.len()).unwrap_or(0)
    }

    fn archive(&self, job_id: JobId, generation: Generation) {
        tracing::debug!(
            job_id = %job_id,
            revision = generation.revision,
            "Index generation retired"
        );
        self.retired.entry(job_id).or_default().push(generation);
    }
}

#[async_trait]
impl TranscriptIndex for InMemoryTranscriptIndex {
    #[instrument(skip(self, segments), fields(job_id = %job_id, count = segments.len()))]
    async fn append(
        &self,
        job_id: JobId,
        revision: u32,
        segments: Vec<TranscriptSegment>,
    ) -> Result<usize, TranscriptIndexError> {
        check_segments(job_id, &segments, self.dimension)?;

        let count = segments.len();
        let fresh = Generation { revision, segments };
        match self.live.entry(job_id) {
            Entry::Occupied(mut slot) => {
                let live = slot.get().revision;
                if live == revision {
                    return Err(TranscriptIndexError::AlreadyIndexed(job_id));
                }
                if live > revision {
                    return Err(TranscriptIndexError::StaleRevision {
                        job_id,
                        live,
                        attempted: revision,
                    });
                }
                let previous = slot.insert(fresh);
                self.archive(job_id, previous);
            }
            Entry::Vacant(slot) => {
                slot.insert(fresh);
            }
        }
        Ok(count)
    }

    async fn query(
        &self,
        job_id: JobId,
        query: &Embedding,
        k: usize,
    ) -> Result<Vec<ScoredSegment>, TranscriptIndexError> {
        check_query(query, self.dimension)?;
        let live = self
            .live
            .get(&job_id)
            .ok_or(TranscriptIndexError::NotFound(job_id))?;
        Ok(rank(&live.segments, query, k, self.metric))
    }

    async fn segments(&self, job_id: JobId) -> Result<Vec<TranscriptSegment>, TranscriptIndexError> {
        self.live
            .get(&job_id)
            .map(|live| live.segments.clone())
            .ok_or(TranscriptIndexError::NotFound(job_id))
    }

    async fn live_revision(&self, job_id: JobId) -> Result<Option<u32>, TranscriptIndexError> {
        Ok(self.live.get(&job_id).map(|live| live.revision))
    }

    #[instrument(skip(self), fields(job_id = %job_id))]
    async fn retire(
        &self,
        job_id: JobId,
        before_revision: u32,
    ) -> Result<bool, TranscriptIndexError> {
        match self
            .live
            .remove_if(&job_id, |_, live| live.revision < before_revision)
        {
            Some((_, generation)) => {
                self.archive(job_id, generation);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
