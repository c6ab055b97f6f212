use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DocumentLevel, DocumentRequest, DocumentType, JobId, TranscriptSegment};

const NOTES_HEADING: &str = "Discussion notes";
pub const EMPTY_SECTION_TEXT: &str = "Not discussed in the recording.";
const ENTRIES_PER_DEPTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub sequence: u32,
    pub start: f64,
    pub end: f64,
    pub speaker: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub heading: String,
    pub entries: Vec<SectionEntry>,
}

/// Structured document assembled from transcript segments. Stored as JSON and
/// rendered into the export formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub job_id: JobId,
    pub revision: u32,
    pub doc_type: DocumentType,
    pub doc_level: DocumentLevel,
    pub title: String,
    pub summary: String,
    pub show_timestamps: bool,
    pub sections: Vec<DocumentSection>,
    pub generated_at: DateTime<Utc>,
}

impl DocumentContent {
    /// Places each segment under the section whose heading shares the most
    /// words with it; segments matching no heading go to a trailing notes
    /// section. Entries keep transcript order.
    pub fn assemble(
        job_id: JobId,
        revision: u32,
        request: &DocumentRequest,
        segments: &[TranscriptSegment],
    ) -> Self {
        let headings = request.doc_type.sections();
        let heading_terms: Vec<BTreeSet<String>> = headings.iter().map(|h| terms(h)).collect();
        let per_section = ENTRIES_PER_DEPTH * request.doc_level.depth_factor();

        let mut sections: Vec<DocumentSection> = headings
            .iter()
            .map(|h| DocumentSection {
                heading: (*h).to_string(),
                entries: Vec::new(),
            })
            .collect();
        let mut notes = DocumentSection {
            heading: NOTES_HEADING.to_string(),
            entries: Vec::new(),
        };

        for segment in segments {
            let segment_terms = terms(&segment.text);
            let best = heading_terms
                .iter()
                .enumerate()
                .map(|(i, h)| (h.intersection(&segment_terms).count(), i))
                .filter(|(overlap, _)| *overlap > 0)
                .max_by(|(a, ia), (b, ib)| a.cmp(b).then(ib.cmp(ia)));

            let target = match best {
                Some((_, i)) => &mut sections[i],
                None => &mut notes,
            };
            if target.entries.len() < per_section {
                target.entries.push(SectionEntry {
                    sequence: segment.sequence,
                    start: segment.start,
                    end: segment.end,
                    speaker: segment.speaker.clone(),
                    text: segment.text.trim().to_string(),
                });
            }
        }

        if !notes.entries.is_empty() {
            sections.push(notes);
        }

        let covered = segments.iter().map(|s| s.end).fold(0.0, f64::max);
        let summary = format!(
            "{} ({} level) generated from {} transcript segments covering {} of recording.",
            request.doc_type.title(),
            request.doc_level,
            segments.len(),
            format_timestamp(covered)
        );

        Self {
            job_id,
            revision,
            doc_type: request.doc_type,
            doc_level: request.doc_level,
            title: request.doc_type.title().to_string(),
            summary,
            show_timestamps: request.doc_level != DocumentLevel::Simple,
            sections,
            generated_at: Utc::now(),
        }
    }

    /// A section entry as a single line of text for the paged exports.
    pub fn entry_line(&self, entry: &SectionEntry) -> String {
        let mut line = String::from("- ");
        if self.show_timestamps {
            line.push_str(&format!("[{}] ", format_timestamp(entry.start)));
        }
        if let Some(speaker) = &entry.speaker {
            line.push_str(&format!("{}: ", speaker));
        }
        line.push_str(&entry.text);
        line
    }
}

fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .map(|w| w.to_lowercase())
        .collect()
}

/// `mm:ss`, or `h:mm:ss` past the hour.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
