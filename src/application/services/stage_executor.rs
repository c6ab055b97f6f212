use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{
    ArtifactStoreError, EmbedderError, ExportError, GenerationError, TranscriptIndexError,
    TranscriptionError, ValidatorError,
};
use crate::domain::{ArtifactKind, ArtifactRef, FailureKind, JobRecord, Stage};

use super::PipelineConfiguration;

/// Runs the collaborator call behind one pipeline stage. Implementations make
/// exactly one attempt; retry decisions belong to the scheduler.
#[async_trait]
pub trait StageExecutor: Send + Sync {
    async fn execute(&self, record: &JobRecord) -> Result<StageOutput, StageError>;
}

/// Artifacts a successful stage hands back for the committing transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOutput {
    pub artifacts: Vec<(ArtifactKind, ArtifactRef)>,
}

impl StageOutput {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_artifact(mut self, kind: ArtifactKind, reference: ArtifactRef) -> Self {
        self.artifacts.push((kind, reference));
        self
    }
}

/// A stage failure normalised into the pipeline's error taxonomy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StageError {
    pub kind: FailureKind,
    pub message: String,
}

impl StageError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transient, message)
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Integrity, message)
    }

    pub fn timeout(stage: Stage, after: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("{} did not finish within {}ms", stage, after.as_millis()),
        )
    }
}

impl From<ValidatorError> for StageError {
    fn from(e: ValidatorError) -> Self {
        match e {
            ValidatorError::InvalidFormat(_) | ValidatorError::CorruptFile(_) => {
                Self::validation(e.to_string())
            }
            ValidatorError::Unavailable(_) => Self::transient(e.to_string()),
        }
    }
}

impl From<TranscriptionError> for StageError {
    fn from(e: TranscriptionError) -> Self {
        match e {
            TranscriptionError::UnsupportedFormat(_) => Self::validation(e.to_string()),
            _ => Self::transient(e.to_string()),
        }
    }
}

impl From<EmbedderError> for StageError {
    fn from(e: EmbedderError) -> Self {
        Self::transient(e.to_string())
    }
}

impl From<TranscriptIndexError> for StageError {
    fn from(e: TranscriptIndexError) -> Self {
        match e {
            TranscriptIndexError::Storage(_) => Self::transient(e.to_string()),
            TranscriptIndexError::EmptyTranscript(_) => Self::validation(e.to_string()),
            _ => Self::integrity(e.to_string()),
        }
    }
}

impl From<GenerationError> for StageError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::EmptyTranscript => Self::validation(e.to_string()),
            _ => Self::transient(e.to_string()),
        }
    }
}

impl From<ExportError> for StageError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::InvalidDocument(_) | ExportError::MissingGlyph(_) => {
                Self::integrity(e.to_string())
            }
            ExportError::RenderFailed(_) | ExportError::Storage(_) => {
                Self::transient(e.to_string())
            }
        }
    }
}

impl From<ArtifactStoreError> for StageError {
    fn from(e: ArtifactStoreError) -> Self {
        match e {
            ArtifactStoreError::NotFound(_) => Self::integrity(e.to_string()),
            _ => Self::transient(e.to_string()),
        }
    }
}

/// Stage → executor lookup.
#[derive(Clone)]
pub struct PipelineStages {
    pub validating: Arc<dyn StageExecutor>,
    pub transcribing: Arc<dyn StageExecutor>,
    pub indexing: Arc<dyn StageExecutor>,
    pub generating: Arc<dyn StageExecutor>,
    pub exporting: Arc<dyn StageExecutor>,
}

impl PipelineStages {
    pub fn executor(&self, stage: Stage) -> Option<&Arc<dyn StageExecutor>> {
        match stage {
            Stage::Validating => Some(&self.validating),
            Stage::Transcribing => Some(&self.transcribing),
            Stage::Indexing => Some(&self.indexing),
            Stage::Generating => Some(&self.generating),
            Stage::Exporting => Some(&self.exporting),
            Stage::Received | Stage::Complete => None,
        }
    }
}

/// Wraps one executor call with the stage timeout. The call runs on its own
/// task so that a timeout aborts it and a panic surfaces as a failure instead
/// of taking the worker down.
pub struct StageHarness {
    stages: PipelineStages,
    config: Arc<PipelineConfiguration>,
}

impl StageHarness {
    pub fn new(stages: PipelineStages, config: Arc<PipelineConfiguration>) -> Self {
        Self { stages, config }
    }

    pub async fn run(&self, record: &JobRecord) -> Result<StageOutput, StageError> {
        let stage = record.stage;
        let executor = self
            .stages
            .executor(stage)
            .cloned()
            .ok_or_else(|| StageError::integrity(format!("no executor for stage {}", stage)))?;
        let timeout = self.config.policy(stage).timeout;

        let snapshot = record.clone();
        let mut handle = tokio::spawn(async move { executor.execute(&snapshot).await });

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(StageError::transient(format!(
                "{} executor aborted: {}",
                stage, join_error
            ))),
            Err(_) => {
                handle.abort();
                tracing::warn!(
                    job_id = %record.id,
                    stage = %stage,
                    timeout_ms = timeout.as_millis() as u64,
                    "Stage timed out"
                );
                Err(StageError::timeout(stage, timeout))
            }
        }
    }
}
