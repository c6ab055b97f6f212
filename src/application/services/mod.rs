mod job_queue;
mod pipeline_configuration;
mod pipeline_scheduler;
mod pipeline_service;
mod stage_executor;
pub mod stages;

pub use job_queue::JobQueue;
pub use pipeline_configuration::{ConfigurationError, PipelineConfiguration, StagePolicy};
pub use pipeline_scheduler::{DispatchOutcome, PipelineScheduler};
pub use pipeline_service::{CancelOutcome, JobStatusView, PipelineError, PipelineService};
pub use stage_executor::{PipelineStages, StageError, StageExecutor, StageHarness, StageOutput};
