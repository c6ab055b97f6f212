use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docpipe::application::services::{
    PipelineConfiguration, PipelineStages, StageError, StageExecutor, StageHarness, StageOutput,
    StagePolicy,
};
use docpipe::domain::{
    ArtifactKind, ArtifactRef, DocumentRequest, FailureKind, JobRecord, MediaRef, Stage,
};
use uuid::Uuid;

enum Behaviour {
    Succeed,
    Sleep(Duration),
    Panic,
}

struct FixedStage(Behaviour);

#[async_trait]
impl StageExecutor for FixedStage {
    async fn execute(&self, _record: &JobRecord) -> Result<StageOutput, StageError> {
        match &self.0 {
            Behaviour::Succeed => Ok(StageOutput::empty()
                .with_artifact(ArtifactKind::Document, ArtifactRef::new("documents/x"))),
            Behaviour::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(StageOutput::empty())
            }
            Behaviour::Panic => panic!("executor bug"),
        }
    }
}

fn harness(behaviour: Behaviour, timeout: Duration) -> StageHarness {
    let executor: Arc<dyn StageExecutor> = Arc::new(FixedStage(behaviour));
    let stages = PipelineStages {
        validating: Arc::clone(&executor),
        transcribing: Arc::clone(&executor),
        indexing: Arc::clone(&executor),
        generating: Arc::clone(&executor),
        exporting: executor,
    };
    let config = PipelineConfiguration::new(1, 8).with_default_policy(StagePolicy {
        timeout,
        max_retries: 0,
    });
    StageHarness::new(stages, Arc::new(config))
}

fn record_at(stage: Stage) -> JobRecord {
    let mut record = JobRecord::new(
        MediaRef::new(Uuid::new_v4(), "a.wav"),
        DocumentRequest::default(),
    );
    record.stage = stage;
    record
}

#[tokio::test]
async fn given_fast_executor_when_running_then_output_is_returned() {
    let harness = harness(Behaviour::Succeed, Duration::from_secs(1));

    let output = harness.run(&record_at(Stage::Generating)).await.unwrap();

    assert_eq!(output.artifacts.len(), 1);
}

#[tokio::test]
async fn given_slow_executor_when_running_then_times_out() {
    let harness = harness(Behaviour::Sleep(Duration::from_secs(30)), Duration::from_millis(30));

    let started = tokio::time::Instant::now();
    let error = harness.run(&record_at(Stage::Transcribing)).await.unwrap_err();

    assert_eq!(error.kind, FailureKind::Timeout);
    assert!(error.message.contains("TRANSCRIBING"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn given_panicking_executor_when_running_then_failure_is_transient() {
    let harness = harness(Behaviour::Panic, Duration::from_secs(1));

    let error = harness.run(&record_at(Stage::Indexing)).await.unwrap_err();

    assert_eq!(error.kind, FailureKind::Transient);
}

#[tokio::test]
async fn given_stage_without_executor_when_running_then_integrity_failure() {
    let harness = harness(Behaviour::Succeed, Duration::from_secs(1));

    let error = harness.run(&record_at(Stage::Complete)).await.unwrap_err();

    assert_eq!(error.kind, FailureKind::Integrity);
}
