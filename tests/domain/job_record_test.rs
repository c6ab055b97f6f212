use docpipe::domain::{
    ArtifactKind, ArtifactRef, DocumentRequest, FailureKind, JobError, JobRecord, JobStatus,
    MediaRef, Stage,
};
use uuid::Uuid;

fn new_record() -> JobRecord {
    JobRecord::new(
        MediaRef::new(Uuid::new_v4(), "standup.mp3"),
        DocumentRequest::default(),
    )
}

#[test]
fn given_new_record_when_created_then_is_received_pending_with_source_artifact() {
    let record = new_record();

    assert_eq!(record.stage, Stage::Received);
    assert_eq!(record.status, JobStatus::Pending);
    assert_eq!(record.revision, 0);
    assert!(record.attempts.is_empty());
    assert_eq!(
        record.artifacts.get(ArtifactKind::Source).map(ArtifactRef::as_str),
        Some(record.source.as_str())
    );
    assert_eq!(record.history.len(), 1);
}

#[test]
fn given_pending_record_when_beginning_attempt_then_running_and_attempt_counted() {
    let mut record = new_record();
    record.stage = Stage::Transcribing;

    record.begin_attempt();
    record.begin_attempt();

    assert_eq!(record.status, JobStatus::Running);
    assert_eq!(record.attempts_for(Stage::Transcribing), 2);
    assert_eq!(record.attempts_for(Stage::Indexing), 0);
}

#[test]
fn given_running_stage_when_advancing_then_next_stage_pending_and_error_cleared() {
    let mut record = new_record();
    record.stage = Stage::Transcribing;
    record.begin_attempt();
    record.last_error = Some(JobError::new(
        Stage::Transcribing,
        FailureKind::Transient,
        "flaky",
        1,
    ));

    record.advance(vec![(
        ArtifactKind::Transcript,
        ArtifactRef::new("transcripts/a/r0/transcript.json"),
    )]);

    assert_eq!(record.stage, Stage::Indexing);
    assert_eq!(record.status, JobStatus::Pending);
    assert!(record.last_error.is_none());
    assert!(record.artifacts.get(ArtifactKind::Transcript).is_some());
}

#[test]
fn given_exporting_stage_when_advancing_then_complete_and_succeeded() {
    let mut record = new_record();
    record.stage = Stage::Exporting;
    record.begin_attempt();

    record.advance(Vec::new());

    assert_eq!(record.stage, Stage::Complete);
    assert_eq!(record.status, JobStatus::Succeeded);
}

#[test]
fn given_recorded_artifact_when_advancing_with_same_kind_then_original_is_kept() {
    let mut record = new_record();
    record.stage = Stage::Generating;
    record
        .artifacts
        .record(ArtifactKind::Document, ArtifactRef::new("documents/first"));

    record.advance(vec![(ArtifactKind::Document, ArtifactRef::new("documents/second"))]);

    assert_eq!(
        record.artifacts.get(ArtifactKind::Document).unwrap().as_str(),
        "documents/first"
    );
}

#[test]
fn given_failed_record_when_reset_for_reprocess_then_new_revision_from_stage() {
    let mut record = new_record();
    record.stage = Stage::Transcribing;
    record.attempts.insert(Stage::Validating, 1);
    record.attempts.insert(Stage::Transcribing, 3);
    record.cancel_requested = true;
    record.fail(JobError::new(
        Stage::Transcribing,
        FailureKind::Timeout,
        "timed out",
        3,
    ));

    record.reset_for_reprocess(Stage::Transcribing);

    assert_eq!(record.revision, 1);
    assert_eq!(record.stage, Stage::Transcribing);
    assert_eq!(record.status, JobStatus::Pending);
    assert_eq!(record.attempts_for(Stage::Validating), 1);
    assert_eq!(record.attempts_for(Stage::Transcribing), 0);
    assert!(record.last_error.is_none());
    assert!(!record.cancel_requested);
}

#[test]
fn given_transition_when_stamping_then_history_records_only_changes() {
    let mut record = new_record();

    record.stamp(Stage::Received, JobStatus::Pending);
    assert_eq!(record.history.len(), 1);

    record.stage = Stage::Validating;
    record.stamp(Stage::Received, JobStatus::Pending);

    assert_eq!(record.history.len(), 2);
    let last = record.history.last().unwrap();
    assert_eq!((last.stage, last.status), (Stage::Validating, JobStatus::Pending));
}

#[test]
fn given_job_error_when_summarising_then_mentions_stage_kind_and_attempt() {
    let error = JobError::new(Stage::Indexing, FailureKind::Integrity, "already indexed", 2);

    let summary = error.summary();

    assert!(summary.contains("INDEXING"));
    assert!(summary.contains("integrity"));
    assert!(summary.contains("attempt 2"));
}

#[test]
fn given_failure_kinds_when_checking_retryable_then_only_transient_and_timeout_retry() {
    assert!(FailureKind::Transient.is_retryable());
    assert!(FailureKind::Timeout.is_retryable());
    assert!(!FailureKind::Validation.is_retryable());
    assert!(!FailureKind::Integrity.is_retryable());
}
