use std::cmp::Ordering;

use crate::application::ports::{DistanceMetric, TranscriptIndexError};
use crate::domain::{Embedding, JobId, ScoredSegment, TranscriptSegment};

/// Checks that there is at least one segment, that segments are numbered
/// densely from 0 and that all carry vectors of the configured dimension.
pub(crate) fn check_segments(
    job_id: JobId,
    segments: &[TranscriptSegment],
    dimension: usize,
) -> Result<(), TranscriptIndexError> {
    if segments.is_empty() {
        return Err(TranscriptIndexError::EmptyTranscript(job_id));
    }
    for (position, segment) in segments.iter().enumerate() {
        let expected = position as u32;
        if segment.sequence != expected {
            return Err(TranscriptIndexError::NonContiguousSequence {
                expected,
                actual: segment.sequence,
            });
        }
        if segment.embedding.dimensions() != dimension {
            return Err(TranscriptIndexError::DimensionMismatch {
                sequence: segment.sequence,
                expected: dimension,
                actual: segment.embedding.dimensions(),
            });
        }
    }
    Ok(())
}

pub(crate) fn check_query(query: &Embedding, dimension: usize) -> Result<(), TranscriptIndexError> {
    if query.dimensions() != dimension {
        return Err(TranscriptIndexError::QueryDimensionMismatch {
            expected: dimension,
            actual: query.dimensions(),
        });
    }
    Ok(())
}

/// Exhaustive kNN: highest score first, equal scores by ascending sequence.
pub(crate) fn rank(
    segments: &[TranscriptSegment],
    query: &Embedding,
    k: usize,
    metric: DistanceMetric,
) -> Vec<ScoredSegment> {
    if k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(f32, &TranscriptSegment)> = segments
        .iter()
        .map(|segment| (metric.score(query, &segment.embedding), segment))
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .partial_cmp(score_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.sequence.cmp(&b.sequence))
    });

    scored
        .into_iter()
        .take(k)
        .map(|(score, segment)| ScoredSegment {
            segment: segment.clone(),
            score,
        })
        .collect()
}
