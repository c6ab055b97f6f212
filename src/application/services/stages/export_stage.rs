use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::Exporter;
use crate::application::services::{StageError, StageExecutor, StageOutput};
use crate::domain::{ArtifactKind, JobRecord};

pub struct ExportStage {
    exporter: Arc<dyn Exporter>,
}

impl ExportStage {
    pub fn new(exporter: Arc<dyn Exporter>) -> Self {
        Self { exporter }
    }
}

#[async_trait]
impl StageExecutor for ExportStage {
    async fn execute(&self, record: &JobRecord) -> Result<StageOutput, StageError> {
        let document = record
            .artifacts
            .get(ArtifactKind::Document)
            .ok_or_else(|| StageError::integrity("document artifact missing"))?;

        let mut output = StageOutput::empty();
        for format in &record.request.formats {
            let exported = self.exporter.export(document, *format).await?;
            tracing::debug!(job_id = %record.id, format = %format, path = %exported, "Export written");
            output = output.with_artifact(ArtifactKind::Export(*format), exported);
        }
        Ok(output)
    }
}
