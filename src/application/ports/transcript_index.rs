use async_trait::async_trait;

use crate::domain::{Embedding, JobId, ScoredSegment, TranscriptSegment};

#[async_trait]
pub trait TranscriptIndex: Send + Sync {
    /// Stores the full, ordered segment list of a job's processing revision.
    /// A live generation from an older revision is retired in the same step;
    /// one from the same or a newer revision rejects the append.
    async fn append(
        &self,
        job_id: JobId,
        revision: u32,
        segments: Vec<TranscriptSegment>,
    ) -> Result<usize, TranscriptIndexError>;

    async fn query(
        &self,
        job_id: JobId,
        query: &Embedding,
        k: usize,
    ) -> Result<Vec<ScoredSegment>, TranscriptIndexError>;

    async fn segments(&self, job_id: JobId) -> Result<Vec<TranscriptSegment>, TranscriptIndexError>;

    /// Revision of the live generation, if any.
    async fn live_revision(&self, job_id: JobId) -> Result<Option<u32>, TranscriptIndexError>;

    /// Archives the live generation if it was built by a revision older than
    /// `before_revision`. Returns `false` when nothing was retired.
    async fn retire(&self, job_id: JobId, before_revision: u32)
    -> Result<bool, TranscriptIndexError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptIndexError {
    #[error("transcript already indexed for job {0}")]
    AlreadyIndexed(JobId),
    #[error("job {job_id} is indexed at revision {live}, newer than {attempted}")]
    StaleRevision {
        job_id: JobId,
        live: u32,
        attempted: u32,
    },
    #[error("no segments to index for job {0}")]
    EmptyTranscript(JobId),
    #[error("no indexed transcript for job {0}")]
    NotFound(JobId),
    #[error("segment {sequence} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        sequence: u32,
        expected: usize,
        actual: usize,
    },
    #[error("query vector has {actual} dimensions, expected {expected}")]
    QueryDimensionMismatch { expected: usize, actual: usize },
    #[error("segment sequence must be dense from 0: expected {expected}, got {actual}")]
    NonContiguousSequence { expected: u32, actual: u32 },
    #[error("storage failed: {0}")]
    Storage(String),
}
