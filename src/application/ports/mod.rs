mod artifact_store;
mod distance_metric;
mod document_generator;
mod embedder;
mod exporter;
mod job_repository;
mod repository_error;
mod transcriber;
mod transcript_index;
mod validator;

pub use artifact_store::{ArtifactStore, ArtifactStoreError};
pub use distance_metric::DistanceMetric;
pub use document_generator::{DocumentGenerator, GenerationError};
pub use embedder::{Embedder, EmbedderError};
pub use exporter::{ExportError, Exporter};
pub use job_repository::{JobMutation, JobRepository};
pub use repository_error::RepositoryError;
pub use transcriber::{Transcriber, TranscriptionError};
pub use transcript_index::{TranscriptIndex, TranscriptIndexError};
pub use validator::{Validator, ValidatorError};
