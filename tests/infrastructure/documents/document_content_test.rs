use docpipe::domain::{
    DocumentLevel, DocumentRequest, DocumentType, Embedding, JobId, TranscribedSpan,
    TranscriptSegment,
};
use docpipe::infrastructure::documents::{DocumentContent, format_timestamp};

fn segment(sequence: u32, text: &str) -> TranscriptSegment {
    TranscriptSegment::from_span(
        sequence,
        TranscribedSpan::new(text, sequence as f64 * 10.0, sequence as f64 * 10.0 + 9.0),
        Embedding::new(vec![0.0; 4]),
    )
}

fn request(level: DocumentLevel) -> DocumentRequest {
    DocumentRequest::new(DocumentType::Brd, level, [])
}

#[test]
fn given_segments_when_assembling_then_headings_follow_document_type() {
    let content = DocumentContent::assemble(
        JobId::new(),
        0,
        &request(DocumentLevel::Intermediate),
        &[segment(0, "The business objectives for this quarter")],
    );

    let headings: Vec<&str> = content.sections.iter().map(|s| s.heading.as_str()).collect();
    let expected: Vec<&str> = DocumentType::Brd.sections().to_vec();
    assert_eq!(&headings[..expected.len()], expected.as_slice());
    assert_eq!(content.title, DocumentType::Brd.title());
    assert!(content.show_timestamps);
}

#[test]
fn given_segment_sharing_heading_words_when_assembling_then_placed_under_that_heading() {
    let content = DocumentContent::assemble(
        JobId::new(),
        0,
        &request(DocumentLevel::Intermediate),
        &[segment(0, "Our business objectives: retain customers")],
    );

    let placed = content
        .sections
        .iter()
        .find(|s| s.entries.iter().any(|e| e.sequence == 0))
        .unwrap();
    assert!(placed.heading.to_lowercase().contains("objectives"));
}

#[test]
fn given_unrelated_segment_when_assembling_then_goes_to_discussion_notes() {
    let content = DocumentContent::assemble(
        JobId::new(),
        0,
        &request(DocumentLevel::Intermediate),
        &[segment(0, "lunch was great")],
    );

    let last = content.sections.last().unwrap();
    assert_eq!(last.heading, "Discussion notes");
    assert_eq!(last.entries.len(), 1);
}

#[test]
fn given_many_matching_segments_when_assembling_simple_level_then_section_is_capped() {
    let segments: Vec<TranscriptSegment> = (0..10)
        .map(|i| segment(i, "more lunch chatter"))
        .collect();

    let content = DocumentContent::assemble(
        JobId::new(),
        2,
        &request(DocumentLevel::Simple),
        &segments,
    );

    let notes = content.sections.last().unwrap();
    assert_eq!(notes.entries.len(), 4);
    let order: Vec<u32> = notes.entries.iter().map(|e| e.sequence).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);
    assert_eq!(content.revision, 2);
    assert!(!content.show_timestamps);
}

#[test]
fn given_seconds_when_formatting_timestamp_then_hours_appear_only_past_the_hour() {
    assert_eq!(format_timestamp(0.0), "00:00");
    assert_eq!(format_timestamp(75.4), "01:15");
    assert_eq!(format_timestamp(3_725.0), "1:02:05");
}
