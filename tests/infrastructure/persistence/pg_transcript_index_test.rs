use docpipe::application::ports::{JobRepository, TranscriptIndex, TranscriptIndexError};
use docpipe::domain::{
    DocumentRequest, Embedding, JobId, JobRecord, MediaRef, TranscribedSpan, TranscriptSegment,
};
use uuid::Uuid;

use crate::helpers::{DIM, TestPostgres};

fn axis(i: usize) -> Embedding {
    let mut values = vec![0.0; DIM];
    values[i] = 1.0;
    Embedding::new(values)
}

fn segment(sequence: u32, text: &str, axis_index: usize) -> TranscriptSegment {
    TranscriptSegment::from_span(
        sequence,
        TranscribedSpan::new(text, sequence as f64, sequence as f64 + 1.0),
        axis(axis_index),
    )
}

fn three_segments() -> Vec<TranscriptSegment> {
    vec![
        segment(0, "budget", 0),
        segment(1, "timeline", 1),
        segment(2, "budget again", 0),
    ]
}

/// Segments reference their job, so every test starts from a stored record.
async fn stored_job(pg: &TestPostgres) -> JobId {
    let record = JobRecord::new(
        MediaRef::new(Uuid::new_v4(), "call.wav"),
        DocumentRequest::default(),
    );
    pg.job_repository.create(&record).await.unwrap();
    record.id
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn given_appended_segments_when_querying_postgres_then_ranked_with_sequence_tiebreak() {
    let pg = TestPostgres::new().await;
    let job = stored_job(&pg).await;

    let count = pg.transcript_index.append(job, 0, three_segments()).await.unwrap();
    let hits = pg.transcript_index.query(job, &axis(0), 3).await.unwrap();

    assert_eq!(count, 3);
    let order: Vec<u32> = hits.iter().map(|h| h.segment.sequence).collect();
    assert_eq!(order, vec![0, 2, 1]);
    assert_eq!(pg.transcript_index.segments(job).await.unwrap(), three_segments());
    assert_eq!(pg.transcript_index.live_revision(job).await.unwrap(), Some(0));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn given_indexed_job_when_appending_same_revision_to_postgres_then_already_indexed() {
    let pg = TestPostgres::new().await;
    let job = stored_job(&pg).await;
    pg.transcript_index.append(job, 0, three_segments()).await.unwrap();

    let result = pg
        .transcript_index
        .append(job, 0, vec![segment(0, "other", 2)])
        .await;

    assert!(matches!(result, Err(TranscriptIndexError::AlreadyIndexed(id)) if id == job));
    assert_eq!(pg.transcript_index.segments(job).await.unwrap(), three_segments());
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn given_retired_generation_when_appending_next_revision_to_postgres_then_only_new_rows_answer() {
    let pg = TestPostgres::new().await;
    let job = stored_job(&pg).await;
    pg.transcript_index.append(job, 0, three_segments()).await.unwrap();

    let retired = pg.transcript_index.retire(job, 1).await.unwrap();
    let after_retire = pg.transcript_index.query(job, &axis(0), 3).await;
    pg.transcript_index
        .append(job, 1, vec![segment(0, "rebuilt", 2)])
        .await
        .unwrap();

    assert!(retired);
    assert!(matches!(after_retire, Err(TranscriptIndexError::NotFound(_))));
    let texts: Vec<String> = pg
        .transcript_index
        .segments(job)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.text)
        .collect();
    assert_eq!(texts, vec!["rebuilt".to_string()]);
    assert_eq!(pg.transcript_index.live_revision(job).await.unwrap(), Some(1));
    let archived: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM transcript_segments WHERE job_id = $1 AND retired_at IS NOT NULL",
    )
    .bind(job.as_uuid())
    .fetch_one(&pg.pool)
    .await
    .unwrap();
    assert_eq!(archived, 3);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn given_generation_at_current_revision_when_retiring_before_it_in_postgres_then_kept() {
    let pg = TestPostgres::new().await;
    let job = stored_job(&pg).await;
    pg.transcript_index.append(job, 2, three_segments()).await.unwrap();

    let retired = pg.transcript_index.retire(job, 2).await.unwrap();

    assert!(!retired);
    assert_eq!(pg.transcript_index.segments(job).await.unwrap(), three_segments());
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn given_newer_live_generation_when_appending_older_revision_to_postgres_then_stale() {
    let pg = TestPostgres::new().await;
    let job = stored_job(&pg).await;
    pg.transcript_index.append(job, 0, three_segments()).await.unwrap();
    pg.transcript_index
        .append(job, 2, vec![segment(0, "newest", 1)])
        .await
        .unwrap();

    let result = pg
        .transcript_index
        .append(job, 1, vec![segment(0, "late", 2)])
        .await;

    assert!(matches!(
        result,
        Err(TranscriptIndexError::StaleRevision { live: 2, attempted: 1, .. })
    ));
    assert_eq!(pg.transcript_index.live_revision(job).await.unwrap(), Some(2));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn given_no_segments_when_appending_to_postgres_then_empty_transcript_and_nothing_stored() {
    let pg = TestPostgres::new().await;
    let job = stored_job(&pg).await;

    let result = pg.transcript_index.append(job, 0, Vec::new()).await;

    assert!(matches!(result, Err(TranscriptIndexError::EmptyTranscript(id)) if id == job));
    assert_eq!(pg.transcript_index.live_revision(job).await.unwrap(), None);
}
