use std::sync::Arc;

use docpipe::application::ports::{ArtifactStore, DocumentGenerator, GenerationError};
use docpipe::domain::{DocumentRequest, Embedding, JobId, TranscribedSpan, TranscriptSegment};
use docpipe::infrastructure::documents::{DocumentContent, TranscriptDocumentGenerator};
use docpipe::infrastructure::storage::ObjectArtifactStore;

fn segment(sequence: u32, text: &str) -> TranscriptSegment {
    TranscriptSegment::from_span(
        sequence,
        TranscribedSpan::new(text, 0.0, 1.0),
        Embedding::new(vec![1.0]),
    )
}

#[tokio::test]
async fn given_segments_when_generating_then_document_stored_under_revision_path() {
    let store: Arc<dyn ArtifactStore> = Arc::new(ObjectArtifactStore::in_memory());
    let generator = TranscriptDocumentGenerator::new(Arc::clone(&store));
    let job = JobId::new();

    let reference = generator
        .generate(job, 3, &DocumentRequest::default(), &[segment(0, "scope of work")])
        .await
        .unwrap();

    assert_eq!(
        reference.as_str(),
        format!("documents/{}/r3/document.json", job.as_uuid())
    );
    let stored: DocumentContent =
        serde_json::from_slice(&store.fetch(reference.as_str()).await.unwrap()).unwrap();
    assert_eq!(stored.job_id, job);
    assert_eq!(stored.revision, 3);
}

#[tokio::test]
async fn given_only_blank_segments_when_generating_then_empty_transcript() {
    let store: Arc<dyn ArtifactStore> = Arc::new(ObjectArtifactStore::in_memory());
    let generator = TranscriptDocumentGenerator::new(store);

    let result = generator
        .generate(
            JobId::new(),
            0,
            &DocumentRequest::default(),
            &[segment(0, "   "), segment(1, "")],
        )
        .await;

    assert!(matches!(result, Err(GenerationError::EmptyTranscript)));
}
