use serde::{Deserialize, Serialize};

use super::Embedding;

/// One timestamped span as returned by a transcriber, before embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscribedSpan {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub speaker: Option<String>,
}

impl TranscribedSpan {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            speaker: None,
        }
    }

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub sequence: u32,
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub speaker: Option<String>,
    pub embedding: Embedding,
}

impl TranscriptSegment {
    pub fn from_span(sequence: u32, span: TranscribedSpan, embedding: Embedding) -> Self {
        Self {
            sequence,
            text: span.text,
            start: span.start,
            end: span.end,
            speaker: span.speaker,
            embedding,
        }
    }
}

/// A segment returned by a similarity lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSegment {
    pub segment: TranscriptSegment,
    pub score: f32,
}
