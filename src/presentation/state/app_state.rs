use std::sync::Arc;

use crate::application::ports::ArtifactStore;
use crate::application::services::PipelineService;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PipelineService>,
    pub store: Arc<dyn ArtifactStore>,
    pub max_upload_bytes: u64,
}
