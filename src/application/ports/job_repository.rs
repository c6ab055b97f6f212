use async_trait::async_trait;

use crate::domain::{JobId, JobRecord, JobStatus, Stage};

use super::RepositoryError;

/// In-memory edit applied to a record inside a compare-and-transition.
pub type JobMutation = Box<dyn FnOnce(&mut JobRecord) + Send>;

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, record: &JobRecord) -> Result<(), RepositoryError>;

    async fn get(&self, id: JobId) -> Result<JobRecord, RepositoryError>;

    /// Applies `mutation` only if the record is still at
    /// (`expected_stage`, `expected_status`); otherwise returns
    /// [`RepositoryError::Conflict`] and leaves the record untouched.
    /// This is the only write path after `create`.
    async fn compare_and_transition(
        &self,
        id: JobId,
        expected_stage: Stage,
        expected_status: JobStatus,
        mutation: JobMutation,
    ) -> Result<JobRecord, RepositoryError>;

    /// Records that are neither terminal nor complete, oldest first.
    async fn list_active(&self) -> Result<Vec<JobRecord>, RepositoryError>;
}
