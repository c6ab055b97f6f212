mod in_memory_transcript_index;
mod pg_transcript_index;
mod ranking;

pub use in_memory_transcript_index::InMemoryTranscriptIndex;
pub use pg_transcript_index::PgTranscriptIndex;
