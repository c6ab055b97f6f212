use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::ports::{JobMutation, JobRepository, RepositoryError};
use crate::domain::{JobError, JobId, JobRecord, JobStatus, Stage};

use super::{JobQueue, PipelineConfiguration, StageHarness};

/// What one dispatch step did to a job.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// `Received` → `Validating`.
    Admitted,
    Advanced { from: Stage, to: Stage },
    Completed,
    Retrying { stage: Stage, attempt: u32 },
    Failed { stage: Stage, attempt: u32 },
    Cancelled { stage: Stage },
    /// Nothing to do: the job is not pending, or another worker claimed it.
    Skipped,
}

/// Drives job records through the stage state machine on a fixed pool of
/// workers. Every write goes through compare-and-transition, so a job can be
/// claimed by at most one worker at a time.
pub struct PipelineScheduler {
    repository: Arc<dyn JobRepository>,
    harness: StageHarness,
    queue: Arc<JobQueue>,
    config: Arc<PipelineConfiguration>,
}

impl PipelineScheduler {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        harness: StageHarness,
        queue: Arc<JobQueue>,
        config: Arc<PipelineConfiguration>,
    ) -> Self {
        Self {
            repository,
            harness,
            queue,
            config,
        }
    }

    /// Re-queues every active record. Records left `Running` by a previous
    /// process are put back to `Pending` on the same stage; their attempt
    /// stays counted.
    pub async fn recover(&self) -> Result<usize, RepositoryError> {
        let active = self.repository.list_active().await?;
        let mut queued = 0;

        for record in active {
            let record = if record.status == JobStatus::Running {
                match self
                    .repository
                    .compare_and_transition(
                        record.id,
                        record.stage,
                        JobStatus::Running,
                        Box::new(|r: &mut JobRecord| r.status = JobStatus::Pending),
                    )
                    .await
                {
                    Ok(reset) => {
                        tracing::warn!(job_id = %reset.id, stage = %reset.stage, "Reset orphaned running job");
                        reset
                    }
                    Err(RepositoryError::Conflict { .. }) => continue,
                    Err(e) => return Err(e),
                }
            } else {
                record
            };

            if record.status == JobStatus::Pending {
                self.queue.push(&record);
                queued += 1;
            }
        }

        tracing::info!(queued, "Pipeline queue recovered");
        Ok(queued)
    }

    /// Starts the worker pool plus a periodic sweeper that re-queues pending
    /// records the queue may have lost.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(self.config.worker_count + 1);
        for worker_id in 0..self.config.worker_count {
            let scheduler = Arc::clone(&self);
            let token = shutdown.clone();
            handles.push(tokio::spawn(scheduler.worker_loop(worker_id, token)));
        }

        let sweeper = Arc::clone(&self);
        handles.push(tokio::spawn(sweeper.sweep_loop(shutdown)));

        tracing::info!(workers = self.config.worker_count, "Pipeline scheduler started");
        handles
    }

    async fn worker_loop(self: Arc<Self>, worker_id: usize, shutdown: CancellationToken) {
        tracing::debug!(worker_id, "Pipeline worker started");
        loop {
            let job_id = tokio::select! {
                _ = shutdown.cancelled() => break,
                job_id = self.queue.pop() => job_id,
            };

            if let Err(e) = self.dispatch(job_id).await {
                tracing::error!(worker_id, job_id = %job_id, error = %e, "Dispatch failed");
            }
        }
        tracing::debug!(worker_id, "Pipeline worker stopped");
    }

    async fn sweep_loop(self: Arc<Self>, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.repository.list_active().await {
                Ok(records) => records
                    .iter()
                    .filter(|r| r.status == JobStatus::Pending)
                    .for_each(|r| self.queue.push(r)),
                Err(e) => tracing::warn!(error = %e, "Pending sweep failed"),
            }
        }
    }

    /// Performs the next step for one job: admission, or one stage attempt
    /// followed by its committing transition.
    pub async fn dispatch(&self, job_id: JobId) -> Result<DispatchOutcome, RepositoryError> {
        let record = self.repository.get(job_id).await?;
        if record.status != JobStatus::Pending {
            tracing::debug!(job_id = %job_id, status = %record.status, "Job not pending, skipping");
            return Ok(DispatchOutcome::Skipped);
        }

        match record.stage {
            Stage::Complete => Ok(DispatchOutcome::Skipped),
            Stage::Received => self.admit(record).await,
            _ => {
                let span = tracing::info_span!(
                    "pipeline_stage",
                    job_id = %record.id,
                    stage = %record.stage,
                    revision = record.revision,
                );
                self.run_stage(record).instrument(span).await
            }
        }
    }

    async fn admit(&self, record: JobRecord) -> Result<DispatchOutcome, RepositoryError> {
        let admitted = self
            .transition(
                record.id,
                Stage::Received,
                JobStatus::Pending,
                Box::new(|r: &mut JobRecord| r.stage = Stage::Validating),
            )
            .await?;

        match admitted {
            Some(record) => {
                tracing::info!(job_id = %record.id, "Job admitted");
                self.queue.push(&record);
                Ok(DispatchOutcome::Admitted)
            }
            None => Ok(DispatchOutcome::Skipped),
        }
    }

    async fn run_stage(&self, record: JobRecord) -> Result<DispatchOutcome, RepositoryError> {
        let stage = record.stage;

        let Some(claimed) = self
            .transition(
                record.id,
                stage,
                JobStatus::Pending,
                Box::new(|r: &mut JobRecord| r.begin_attempt()),
            )
            .await?
        else {
            return Ok(DispatchOutcome::Skipped);
        };

        let attempt = claimed.attempts_for(stage);
        let policy = self.config.policy(stage);
        tracing::info!(attempt, max_retries = policy.max_retries, "Stage started");

        let result = self.harness.run(&claimed).await;

        let mutation: JobMutation = match result {
            Ok(output) => Box::new(move |r: &mut JobRecord| {
                if r.cancel_requested {
                    r.cancel();
                } else {
                    r.advance(output.artifacts);
                }
            }),
            Err(e) => {
                let error = JobError::new(stage, e.kind, e.message, attempt);
                if e.kind.is_retryable() && attempt <= policy.max_retries {
                    tracing::warn!(attempt, error = %error.summary(), "Stage failed, will retry");
                    Box::new(move |r: &mut JobRecord| {
                        if r.cancel_requested {
                            r.last_error = Some(error);
                            r.cancel();
                        } else {
                            r.retry(error);
                        }
                    })
                } else {
                    tracing::error!(attempt, error = %error.summary(), "Stage failed permanently");
                    Box::new(move |r: &mut JobRecord| r.fail(error))
                }
            }
        };

        let committed = self
            .repository
            .compare_and_transition(claimed.id, stage, JobStatus::Running, mutation)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, "Running job changed under its owner");
            })?;

        if committed.status == JobStatus::Pending {
            self.queue.push(&committed);
        }

        let outcome = match committed.status {
            JobStatus::Pending if committed.stage == stage => {
                DispatchOutcome::Retrying { stage, attempt }
            }
            JobStatus::Pending => DispatchOutcome::Advanced {
                from: stage,
                to: committed.stage,
            },
            JobStatus::Succeeded => DispatchOutcome::Completed,
            JobStatus::Failed => DispatchOutcome::Failed { stage, attempt },
            JobStatus::Cancelled => DispatchOutcome::Cancelled { stage },
            JobStatus::Running => DispatchOutcome::Skipped,
        };
        tracing::info!(outcome = ?outcome, "Stage finished");

        Ok(outcome)
    }

    /// Compare-and-transition where losing the race is a normal outcome.
    async fn transition(
        &self,
        id: JobId,
        stage: Stage,
        status: JobStatus,
        mutation: JobMutation,
    ) -> Result<Option<JobRecord>, RepositoryError> {
        match self
            .repository
            .compare_and_transition(id, stage, status, mutation)
            .await
        {
            Ok(record) => Ok(Some(record)),
            Err(RepositoryError::Conflict { .. }) => {
                tracing::debug!(job_id = %id, stage = %stage, "Lost claim to another worker");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
