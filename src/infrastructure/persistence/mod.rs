mod pg_pool;
mod repositories;
mod transcript_index;

pub use repositories::InMemoryJobRepository;
pub use repositories::PgJobRepository;

pub use pg_pool::{create_pool, run_migrations};

pub use transcript_index::InMemoryTranscriptIndex;
pub use transcript_index::PgTranscriptIndex;
