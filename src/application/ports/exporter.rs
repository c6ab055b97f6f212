use async_trait::async_trait;

use crate::domain::{ArtifactRef, ExportFormat};

#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(
        &self,
        document: &ArtifactRef,
        format: ExportFormat,
    ) -> Result<ArtifactRef, ExportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("document unreadable: {0}")]
    InvalidDocument(String),
    #[error("no configured font has a glyph for {0:?}")]
    MissingGlyph(char),
    #[error("render failed: {0}")]
    RenderFailed(String),
    #[error("storage failed: {0}")]
    Storage(String),
}
