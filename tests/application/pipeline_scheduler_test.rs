use std::sync::Arc;
use std::time::Duration;

use docpipe::application::ports::{JobRepository, TranscriptIndex};
use docpipe::application::services::{DispatchOutcome, StagePolicy};
use docpipe::domain::{
    ArtifactKind, DocumentRequest, ExportFormat, FailureKind, JobRecord, JobStatus, MediaRef, Stage,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::helpers::{
    ScriptedTranscriber, TestPipeline, TranscriberFailure, sample_spans, test_config, wav_bytes,
};

#[tokio::test]
async fn given_submitted_job_when_drained_then_every_stage_runs_in_order_to_complete() {
    let transcriber = Arc::new(ScriptedTranscriber::returning(sample_spans()));
    let pipeline = TestPipeline::new(transcriber.clone());
    let job_id = pipeline.submit().await;

    let outcomes = pipeline.drain().await;

    assert_eq!(
        outcomes,
        vec![
            DispatchOutcome::Admitted,
            DispatchOutcome::Advanced { from: Stage::Validating, to: Stage::Transcribing },
            DispatchOutcome::Advanced { from: Stage::Transcribing, to: Stage::Indexing },
            DispatchOutcome::Advanced { from: Stage::Indexing, to: Stage::Generating },
            DispatchOutcome::Advanced { from: Stage::Generating, to: Stage::Exporting },
            DispatchOutcome::Completed,
        ]
    );

    let record = pipeline.record(job_id).await;
    assert_eq!(record.stage, Stage::Complete);
    assert_eq!(record.status, JobStatus::Succeeded);
    assert_eq!(transcriber.calls(), 1);
    for stage in Stage::EXECUTABLE {
        assert_eq!(record.attempts_for(stage), 1, "attempts at {}", stage);
    }
    for format in ExportFormat::DEFAULT {
        assert!(record.artifacts.export(format).is_some(), "missing {} export", format);
    }
}

#[tokio::test]
async fn given_completed_job_when_reading_history_then_stages_never_go_backwards() {
    let pipeline = TestPipeline::new(Arc::new(ScriptedTranscriber::returning(sample_spans())));
    let job_id = pipeline.submit().await;

    pipeline.drain().await;

    let record = pipeline.record(job_id).await;
    assert!(record.history.windows(2).all(|w| w[0].stage <= w[1].stage));
    let last = record.history.last().unwrap();
    assert_eq!((last.stage, last.status), (Stage::Complete, JobStatus::Succeeded));
}

#[tokio::test]
async fn given_completed_job_when_reading_index_then_segments_follow_transcript_order() {
    let pipeline = TestPipeline::new(Arc::new(ScriptedTranscriber::returning(sample_spans())));
    let job_id = pipeline.submit().await;

    pipeline.drain().await;

    let segments = pipeline.index.segments(job_id).await.unwrap();
    let sequences: Vec<u32> = segments.iter().map(|s| s.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2]);
    assert_eq!(segments[1].speaker.as_deref(), Some("Bob"));
}

#[tokio::test]
async fn given_transcriber_failing_twice_when_drained_then_third_attempt_succeeds() {
    let transcriber = Arc::new(ScriptedTranscriber::failing_first(
        2,
        TranscriberFailure::Transient,
        sample_spans(),
    ));
    let pipeline = TestPipeline::new(transcriber.clone());
    let job_id = pipeline.submit().await;

    let outcomes = pipeline.drain().await;

    assert!(outcomes.contains(&DispatchOutcome::Retrying { stage: Stage::Transcribing, attempt: 1 }));
    assert!(outcomes.contains(&DispatchOutcome::Retrying { stage: Stage::Transcribing, attempt: 2 }));
    let record = pipeline.record(job_id).await;
    assert_eq!(record.status, JobStatus::Succeeded);
    assert_eq!(record.attempts_for(Stage::Transcribing), 3);
    assert_eq!(transcriber.calls(), 3);
    assert!(record.last_error.is_none());
}

#[tokio::test]
async fn given_transcriber_failing_past_retry_budget_when_drained_then_job_fails() {
    let transcriber = Arc::new(ScriptedTranscriber::failing_first(
        3,
        TranscriberFailure::Transient,
        sample_spans(),
    ));
    let pipeline = TestPipeline::new(transcriber.clone());
    let job_id = pipeline.submit().await;

    let outcomes = pipeline.drain().await;

    assert_eq!(
        outcomes.last(),
        Some(&DispatchOutcome::Failed { stage: Stage::Transcribing, attempt: 3 })
    );
    let record = pipeline.record(job_id).await;
    assert_eq!(record.stage, Stage::Transcribing);
    assert_eq!(record.status, JobStatus::Failed);
    let error = record.last_error.expect("error recorded");
    assert_eq!(error.kind, FailureKind::Transient);
    assert_eq!(error.attempt, 3);
    assert!(record.artifacts.get(ArtifactKind::Transcript).is_none());
}

#[tokio::test]
async fn given_hanging_transcriber_when_drained_then_each_attempt_times_out_until_failed() {
    let transcriber = Arc::new(ScriptedTranscriber::hanging());
    let config = test_config().with_stage_policy(
        Stage::Transcribing,
        StagePolicy {
            timeout: Duration::from_millis(50),
            max_retries: 2,
        },
    );
    let pipeline = TestPipeline::with_config(transcriber.clone(), config);
    let job_id = pipeline.submit().await;

    pipeline.drain().await;

    let record = pipeline.record(job_id).await;
    assert_eq!(record.stage, Stage::Transcribing);
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.attempts_for(Stage::Transcribing), 3);
    assert_eq!(record.last_error.unwrap().kind, FailureKind::Timeout);
    assert_eq!(transcriber.calls(), 3);
}

#[tokio::test]
async fn given_unsupported_media_when_transcribing_then_fails_without_retry() {
    let transcriber = Arc::new(ScriptedTranscriber::failing_first(
        1,
        TranscriberFailure::Unsupported,
        sample_spans(),
    ));
    let pipeline = TestPipeline::new(transcriber.clone());
    let job_id = pipeline.submit().await;

    pipeline.drain().await;

    let record = pipeline.record(job_id).await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.attempts_for(Stage::Transcribing), 1);
    assert_eq!(record.last_error.unwrap().kind, FailureKind::Validation);
}

#[tokio::test]
async fn given_invalid_media_when_validating_then_terminal_after_one_attempt() {
    let transcriber = Arc::new(ScriptedTranscriber::returning(sample_spans()));
    let pipeline = TestPipeline::new(transcriber.clone());
    let media = pipeline.upload("notes.mp3", b"plain text, not audio".to_vec()).await;
    let job_id = pipeline
        .service
        .submit(media, DocumentRequest::default())
        .await
        .unwrap();

    pipeline.drain().await;

    let record = pipeline.record(job_id).await;
    assert_eq!(record.stage, Stage::Validating);
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.attempts_for(Stage::Validating), 1);
    assert_eq!(record.last_error.unwrap().kind, FailureKind::Validation);
    assert_eq!(transcriber.calls(), 0);
}

#[tokio::test]
async fn given_job_held_by_one_worker_when_dispatched_again_then_second_dispatch_skips() {
    let (pipeline, gate) = TestPipeline::gated(
        Arc::new(ScriptedTranscriber::returning(sample_spans())),
        Stage::Validating,
    );
    let job_id = pipeline.submit().await;
    pipeline.drive_to(job_id, Stage::Validating).await;
    pipeline.queue.try_pop();

    let first = {
        let scheduler = Arc::clone(&pipeline.scheduler);
        tokio::spawn(async move { scheduler.dispatch(job_id).await })
    };
    gate.entered.notified().await;

    let second = pipeline.scheduler.dispatch(job_id).await.unwrap();
    gate.release.notify_one();
    let first = first.await.unwrap().unwrap();

    assert_eq!(second, DispatchOutcome::Skipped);
    assert_eq!(
        first,
        DispatchOutcome::Advanced { from: Stage::Validating, to: Stage::Transcribing }
    );
    assert_eq!(pipeline.record(job_id).await.attempts_for(Stage::Validating), 1);
}

#[tokio::test]
async fn given_terminal_job_when_dispatched_then_skipped() {
    let pipeline = TestPipeline::new(Arc::new(ScriptedTranscriber::returning(sample_spans())));
    let job_id = pipeline.submit().await;
    pipeline.drain().await;

    let outcome = pipeline.scheduler.dispatch(job_id).await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Skipped);
}

#[tokio::test]
async fn given_running_job_left_by_previous_process_when_recovering_then_requeued_as_pending() {
    let pipeline = TestPipeline::new(Arc::new(ScriptedTranscriber::returning(sample_spans())));
    let media = pipeline.upload("meeting.wav", wav_bytes()).await;
    let mut orphan = JobRecord::new(media, DocumentRequest::default());
    orphan.stage = Stage::Transcribing;
    orphan.begin_attempt();
    pipeline.repository.create(&orphan).await.unwrap();

    let mut finished = JobRecord::new(
        MediaRef::new(Uuid::new_v4(), "old.wav"),
        DocumentRequest::default(),
    );
    finished.status = JobStatus::Failed;
    pipeline.repository.create(&finished).await.unwrap();

    let queued = pipeline.scheduler.recover().await.unwrap();

    assert_eq!(queued, 1);
    let record = pipeline.record(orphan.id).await;
    assert_eq!(record.status, JobStatus::Pending);
    assert_eq!(record.attempts_for(Stage::Transcribing), 1);
    assert_eq!(pipeline.queue.try_pop(), Some(orphan.id));
}

#[tokio::test]
async fn given_spawned_workers_when_jobs_submitted_then_all_complete() {
    let pipeline = TestPipeline::new(Arc::new(ScriptedTranscriber::returning(sample_spans())));
    let token = CancellationToken::new();
    let handles = Arc::clone(&pipeline.scheduler).spawn(token.clone());

    let first = pipeline.submit().await;
    let second = pipeline.submit().await;
    let first = pipeline.wait_until_terminal(first, Duration::from_secs(10)).await;
    let second = pipeline.wait_until_terminal(second, Duration::from_secs(10)).await;

    token.cancel();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(first.status, JobStatus::Succeeded);
    assert_eq!(second.status, JobStatus::Succeeded);
}

#[tokio::test]
async fn given_job_missing_from_queue_when_sweeper_runs_then_job_is_picked_up() {
    let pipeline = TestPipeline::new(Arc::new(ScriptedTranscriber::returning(sample_spans())));
    let job_id = pipeline.submit().await;
    pipeline.queue.try_pop();

    let token = CancellationToken::new();
    let handles = Arc::clone(&pipeline.scheduler).spawn(token.clone());
    let record = pipeline.wait_until_terminal(job_id, Duration::from_secs(10)).await;
    token.cancel();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(record.status, JobStatus::Succeeded);
}
