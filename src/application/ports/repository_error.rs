use crate::domain::{JobId, JobStatus, Stage};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("not found: {0}")]
    NotFound(JobId),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error(
        "conflict on job {id}: expected {expected_stage}/{expected_status}, found {actual_stage}/{actual_status}"
    )]
    Conflict {
        id: JobId,
        expected_stage: Stage,
        expected_status: JobStatus,
        actual_stage: Stage,
        actual_status: JobStatus,
    },
}
