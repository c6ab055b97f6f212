use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::Validator;
use crate::application::services::{StageError, StageExecutor, StageOutput};
use crate::domain::JobRecord;

pub struct ValidateStage {
    validator: Arc<dyn Validator>,
}

impl ValidateStage {
    pub fn new(validator: Arc<dyn Validator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl StageExecutor for ValidateStage {
    async fn execute(&self, record: &JobRecord) -> Result<StageOutput, StageError> {
        self.validator.validate(&record.source).await?;
        tracing::debug!(job_id = %record.id, source = %record.source, "Media validated");
        Ok(StageOutput::empty())
    }
}
