use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::ports::{JobRepository, RepositoryError, TranscriptIndex};
use crate::domain::{
    Artifacts, DocumentRequest, FailureKind, JobError, JobId, JobRecord, JobStatus, MediaRef,
    Stage,
};

use super::JobQueue;

const CANCEL_ATTEMPTS: usize = 3;

/// Read-only projection of a job record for pollers. Failures are reported
/// by summary, kind and stage; collaborator messages stay in the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatusView {
    pub job_id: JobId,
    pub stage: Stage,
    pub status: JobStatus,
    pub progress: u8,
    pub last_error: Option<String>,
    pub error_kind: Option<FailureKind>,
    pub failed_stage: Option<Stage>,
    pub cancel_requested: bool,
    pub revision: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&JobRecord> for JobStatusView {
    fn from(record: &JobRecord) -> Self {
        let progress = if record.status == JobStatus::Succeeded {
            100
        } else {
            record.stage.progress()
        };
        Self {
            job_id: record.id,
            stage: record.stage,
            status: record.status,
            progress,
            last_error: record.last_error.as_ref().map(JobError::summary),
            error_kind: record.last_error.as_ref().map(|e| e.kind),
            failed_stage: record.last_error.as_ref().map(|e| e.stage),
            cancel_requested: record.cancel_requested,
            revision: record.revision,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    /// The job was pending and is now cancelled.
    Cancelled,
    /// The job is running; cancellation applies when the current stage ends.
    Requested,
}

/// Operations the request layer calls: submit, poll, cancel and reprocess.
pub struct PipelineService {
    repository: Arc<dyn JobRepository>,
    index: Arc<dyn TranscriptIndex>,
    queue: Arc<JobQueue>,
}

impl PipelineService {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        index: Arc<dyn TranscriptIndex>,
        queue: Arc<JobQueue>,
    ) -> Self {
        Self {
            repository,
            index,
            queue,
        }
    }

    #[tracing::instrument(skip(self, request), fields(source = %source))]
    pub async fn submit(
        &self,
        source: MediaRef,
        request: DocumentRequest,
    ) -> Result<JobId, PipelineError> {
        let record = JobRecord::new(source, request);
        self.repository.create(&record).await?;
        self.queue.push(&record);

        tracing::info!(
            job_id = %record.id,
            doc_type = %record.request.doc_type,
            doc_level = %record.request.doc_level,
            "Job submitted"
        );
        Ok(record.id)
    }

    pub async fn get_record(&self, job_id: JobId) -> Result<JobRecord, PipelineError> {
        Ok(self.repository.get(job_id).await?)
    }

    pub async fn get_status(&self, job_id: JobId) -> Result<JobStatusView, PipelineError> {
        let record = self.repository.get(job_id).await?;
        Ok(JobStatusView::from(&record))
    }

    pub async fn get_artifacts(&self, job_id: JobId) -> Result<Artifacts, PipelineError> {
        let record = self.repository.get(job_id).await?;
        if record.stage < Stage::Generating {
            return Err(PipelineError::NotReady {
                id: job_id,
                stage: record.stage,
            });
        }
        Ok(record.artifacts)
    }

    /// Cooperative cancel. A pending job is cancelled at once; a running job
    /// is flagged and cancelled at its next stage boundary, provided that
    /// boundary is still before `Exporting`.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, job_id: JobId) -> Result<CancelOutcome, PipelineError> {
        for _ in 0..CANCEL_ATTEMPTS {
            let record = self.repository.get(job_id).await?;
            if record.is_terminal() {
                return Err(PipelineError::AlreadyTerminal(job_id));
            }

            let result = match record.status {
                JobStatus::Pending => {
                    if !record.stage.is_cancellable() {
                        return Err(PipelineError::NotCancellable {
                            id: job_id,
                            stage: record.stage,
                        });
                    }
                    self.repository
                        .compare_and_transition(
                            job_id,
                            record.stage,
                            JobStatus::Pending,
                            Box::new(|r: &mut JobRecord| r.cancel()),
                        )
                        .await
                        .map(|_| CancelOutcome::Cancelled)
                }
                JobStatus::Running => {
                    let boundary_cancellable = record
                        .stage
                        .next()
                        .is_some_and(|next| next.is_cancellable());
                    if !boundary_cancellable {
                        return Err(PipelineError::NotCancellable {
                            id: job_id,
                            stage: record.stage,
                        });
                    }
                    if record.cancel_requested {
                        return Ok(CancelOutcome::Requested);
                    }
                    self.repository
                        .compare_and_transition(
                            job_id,
                            record.stage,
                            JobStatus::Running,
                            Box::new(|r: &mut JobRecord| r.cancel_requested = true),
                        )
                        .await
                        .map(|_| CancelOutcome::Requested)
                }
                _ => return Err(PipelineError::AlreadyTerminal(job_id)),
            };

            match result {
                Ok(outcome) => {
                    tracing::info!(outcome = ?outcome, stage = %record.stage, "Cancel accepted");
                    return Ok(outcome);
                }
                Err(RepositoryError::Conflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(PipelineError::Conflict(job_id))
    }

    /// Operator-initiated retry from `from_stage` on a finished job.
    #[tracing::instrument(skip(self))]
    pub async fn reprocess(&self, job_id: JobId, from_stage: Stage) -> Result<(), PipelineError> {
        if !from_stage.is_executable() {
            return Err(PipelineError::InvalidStage(format!(
                "{} cannot be reprocessed",
                from_stage
            )));
        }

        let record = self.repository.get(job_id).await?;
        if !record.is_terminal() {
            return Err(PipelineError::StillActive(job_id));
        }
        if from_stage > record.stage {
            return Err(PipelineError::InvalidStage(format!(
                "{} is after the job's current stage {}",
                from_stage, record.stage
            )));
        }

        let reset = self
            .repository
            .compare_and_transition(
                job_id,
                record.stage,
                record.status,
                Box::new(move |r: &mut JobRecord| r.reset_for_reprocess(from_stage)),
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict { .. } => PipelineError::Conflict(job_id),
                other => other.into(),
            })?;

        // Only the caller that won the transition retires, and only generations
        // older than the revision it started.
        if from_stage <= Stage::Indexing {
            match self.index.retire(job_id, reset.revision).await {
                Ok(retired) => tracing::debug!(retired, "Transcript index retired for reprocessing"),
                Err(e) => tracing::warn!(
                    error = %e,
                    "Index not retired; the rebuilt index replaces it on append"
                ),
            }
        }

        self.queue.push(&reset);
        tracing::info!(revision = reset.revision, from_stage = %from_stage, "Job reprocessing");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("artifacts of job {id} not ready: job is at {stage}")]
    NotReady { id: JobId, stage: Stage },
    #[error("job {0} already reached a terminal state")]
    AlreadyTerminal(JobId),
    #[error("job {id} can no longer be cancelled at {stage}")]
    NotCancellable { id: JobId, stage: Stage },
    #[error("invalid stage: {0}")]
    InvalidStage(String),
    #[error("job {0} is still being processed")]
    StillActive(JobId),
    #[error("job {0} changed concurrently, try again")]
    Conflict(JobId),
    #[error("repository: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for PipelineError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(id) => PipelineError::NotFound(id),
            RepositoryError::Conflict { id, .. } => PipelineError::Conflict(id),
            other => PipelineError::Repository(other),
        }
    }
}
