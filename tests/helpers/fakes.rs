use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

use docpipe::application::ports::{
    JobMutation, JobRepository, RepositoryError, Transcriber, TranscriptionError, Validator,
    ValidatorError,
};
use docpipe::application::services::{StageError, StageExecutor, StageOutput};
use docpipe::domain::{JobId, JobRecord, JobStatus, MediaRef, Stage, TranscribedSpan};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TranscriberFailure {
    /// Retryable API failure.
    Transient,
    /// Terminal: the media cannot be transcribed.
    Unsupported,
}

/// Transcriber whose first `failures` calls fail, or that never answers.
pub struct ScriptedTranscriber {
    spans: Vec<TranscribedSpan>,
    failures: AtomicU32,
    failure: TranscriberFailure,
    hang: bool,
    calls: AtomicU32,
}

impl ScriptedTranscriber {
    pub fn returning(spans: Vec<TranscribedSpan>) -> Self {
        Self {
            spans,
            failures: AtomicU32::new(0),
            failure: TranscriberFailure::Transient,
            hang: false,
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing_first(
        times: u32,
        failure: TranscriberFailure,
        spans: Vec<TranscribedSpan>,
    ) -> Self {
        Self {
            failures: AtomicU32::new(times),
            failure,
            ..Self::returning(spans)
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::returning(Vec::new())
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(
        &self,
        _media: &MediaRef,
    ) -> Result<Vec<TranscribedSpan>, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(match self.failure {
                TranscriberFailure::Transient => {
                    TranscriptionError::ApiRequestFailed("status 503: overloaded".to_string())
                }
                TranscriberFailure::Unsupported => {
                    TranscriptionError::UnsupportedFormat("no audio track".to_string())
                }
            });
        }

        Ok(self.spans.clone())
    }
}

pub struct StaticValidator {
    reject: Option<String>,
}

impl StaticValidator {
    pub fn accepting() -> Self {
        Self { reject: None }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            reject: Some(reason.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl Validator for StaticValidator {
    async fn validate(&self, _media: &MediaRef) -> Result<(), ValidatorError> {
        match &self.reject {
            Some(reason) => Err(ValidatorError::InvalidFormat(reason.clone())),
            None => Ok(()),
        }
    }
}

/// Wraps a stage so a test can observe it running and decide when it ends.
pub struct GatedStage {
    inner: Arc<dyn StageExecutor>,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl GatedStage {
    pub fn new(inner: Arc<dyn StageExecutor>) -> Self {
        Self {
            inner,
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait::async_trait]
impl StageExecutor for GatedStage {
    async fn execute(&self, record: &JobRecord) -> Result<StageOutput, StageError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.execute(record).await
    }
}

/// Answers every `get` with a record read earlier, like a caller that loaded
/// the job before another caller changed it. Writes go to the real store.
pub struct StaleReadRepository {
    inner: Arc<dyn JobRepository>,
    snapshot: JobRecord,
}

impl StaleReadRepository {
    pub fn new(inner: Arc<dyn JobRepository>, snapshot: JobRecord) -> Self {
        Self { inner, snapshot }
    }
}

#[async_trait::async_trait]
impl JobRepository for StaleReadRepository {
    async fn create(&self, record: &JobRecord) -> Result<(), RepositoryError> {
        self.inner.create(record).await
    }

    async fn get(&self, _id: JobId) -> Result<JobRecord, RepositoryError> {
        Ok(self.snapshot.clone())
    }

    async fn compare_and_transition(
        &self,
        id: JobId,
        expected_stage: Stage,
        expected_status: JobStatus,
        mutation: JobMutation,
    ) -> Result<JobRecord, RepositoryError> {
        self.inner
            .compare_and_transition(id, expected_stage, expected_status, mutation)
            .await
    }

    async fn list_active(&self) -> Result<Vec<JobRecord>, RepositoryError> {
        self.inner.list_active().await
    }
}
