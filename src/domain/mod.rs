mod artifact;
mod document_request;
mod embedding;
mod export_format;
mod job_error;
mod job_id;
mod job_record;
mod job_status;
mod media_ref;
mod stage;
mod transcript_segment;

pub use artifact::{ArtifactKind, ArtifactRef, Artifacts, SupersededArtifact};
pub use document_request::{DocumentLevel, DocumentRequest, DocumentType};
pub use embedding::Embedding;
pub use export_format::ExportFormat;
pub use job_error::{FailureKind, JobError};
pub use job_id::JobId;
pub use job_record::{JobRecord, TransitionEntry};
pub use job_status::JobStatus;
pub use media_ref::MediaRef;
pub use stage::Stage;
pub use transcript_segment::{ScoredSegment, TranscribedSpan, TranscriptSegment};
