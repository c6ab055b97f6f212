use std::sync::Arc;

use docpipe::application::ports::{JobRepository, RepositoryError};
use docpipe::domain::{DocumentRequest, JobId, JobRecord, JobStatus, MediaRef, Stage};
use docpipe::infrastructure::persistence::InMemoryJobRepository;
use uuid::Uuid;

fn new_record() -> JobRecord {
    JobRecord::new(
        MediaRef::new(Uuid::new_v4(), "call.wav"),
        DocumentRequest::default(),
    )
}

#[tokio::test]
async fn given_created_record_when_getting_then_returns_copy() {
    let repository = InMemoryJobRepository::new();
    let record = new_record();

    repository.create(&record).await.unwrap();
    let fetched = repository.get(record.id).await.unwrap();

    assert_eq!(fetched, record);
}

#[tokio::test]
async fn given_existing_id_when_creating_again_then_constraint_violation() {
    let repository = InMemoryJobRepository::new();
    let record = new_record();
    repository.create(&record).await.unwrap();

    let result = repository.create(&record).await;

    assert!(matches!(result, Err(RepositoryError::ConstraintViolation(_))));
}

#[tokio::test]
async fn given_unknown_id_when_getting_then_not_found() {
    let repository = InMemoryJobRepository::new();

    let result = repository.get(JobId::new()).await;

    assert!(matches!(result, Err(RepositoryError::NotFound(_))));
}

#[tokio::test]
async fn given_matching_expectation_when_transitioning_then_mutation_applied_and_stamped() {
    let repository = InMemoryJobRepository::new();
    let record = new_record();
    repository.create(&record).await.unwrap();

    let updated = repository
        .compare_and_transition(
            record.id,
            Stage::Received,
            JobStatus::Pending,
            Box::new(|r: &mut JobRecord| r.stage = Stage::Validating),
        )
        .await
        .unwrap();

    assert_eq!(updated.stage, Stage::Validating);
    assert_eq!(updated.history.len(), 2);
    assert!(updated.updated_at >= record.updated_at);
    assert_eq!(repository.get(record.id).await.unwrap(), updated);
}

#[tokio::test]
async fn given_stale_expectation_when_transitioning_then_conflict_and_record_untouched() {
    let repository = InMemoryJobRepository::new();
    let record = new_record();
    repository.create(&record).await.unwrap();

    let result = repository
        .compare_and_transition(
            record.id,
            Stage::Validating,
            JobStatus::Pending,
            Box::new(|r: &mut JobRecord| r.status = JobStatus::Failed),
        )
        .await;

    match result {
        Err(RepositoryError::Conflict {
            actual_stage,
            actual_status,
            ..
        }) => {
            assert_eq!(actual_stage, Stage::Received);
            assert_eq!(actual_status, JobStatus::Pending);
        }
        other => panic!("expected conflict, got {:?}", other),
    }
    assert_eq!(repository.get(record.id).await.unwrap(), record);
}

#[tokio::test]
async fn given_concurrent_claims_when_transitioning_then_exactly_one_wins() {
    let repository = Arc::new(InMemoryJobRepository::new());
    let record = new_record();
    repository.create(&record).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let repository = Arc::clone(&repository);
        let id = record.id;
        handles.push(tokio::spawn(async move {
            repository
                .compare_and_transition(
                    id,
                    Stage::Received,
                    JobStatus::Pending,
                    Box::new(|r: &mut JobRecord| r.begin_attempt()),
                )
                .await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(RepositoryError::Conflict { .. }) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(wins, 1);
    assert_eq!(
        repository.get(record.id).await.unwrap().attempts_for(Stage::Received),
        1
    );
}

#[tokio::test]
async fn given_mixed_records_when_listing_active_then_terminal_excluded_and_oldest_first() {
    let repository = InMemoryJobRepository::new();
    let older = new_record();
    let mut newer = new_record();
    newer.created_at = older.created_at + chrono::Duration::seconds(5);
    let mut done = new_record();
    done.status = JobStatus::Cancelled;

    repository.create(&newer).await.unwrap();
    repository.create(&done).await.unwrap();
    repository.create(&older).await.unwrap();

    let active: Vec<JobId> = repository
        .list_active()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();

    assert_eq!(active, vec![older.id, newer.id]);
}
