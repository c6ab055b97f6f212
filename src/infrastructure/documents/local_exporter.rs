use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::application::ports::{ArtifactStore, ArtifactStoreError, ExportError, Exporter};
use crate::domain::{ArtifactRef, ExportFormat};

use super::DocumentContent;
use super::docx_renderer::render_docx;
use super::html_renderer::render_html;
use super::pdf_renderer::PdfRenderer;

/// Renders stored documents in-process.
pub struct LocalExporter {
    store: Arc<dyn ArtifactStore>,
    pdf: PdfRenderer,
}

impl LocalExporter {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            pdf: PdfRenderer::bundled(),
        }
    }

    pub fn with_pdf_renderer(mut self, pdf: PdfRenderer) -> Self {
        self.pdf = pdf;
        self
    }
}

fn export_path(document: &ArtifactRef, format: ExportFormat) -> String {
    let dir = document
        .as_str()
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("documents");
    format!("{}/exports/document.{}", dir, format.extension())
}

#[async_trait]
impl Exporter for LocalExporter {
    #[tracing::instrument(skip(self), fields(document = %document, format = %format))]
    async fn export(
        &self,
        document: &ArtifactRef,
        format: ExportFormat,
    ) -> Result<ArtifactRef, ExportError> {
        let raw = self
            .store
            .fetch(document.as_str())
            .await
            .map_err(|e| match e {
                ArtifactStoreError::NotFound(path) => ExportError::InvalidDocument(format!("{} is missing", path)),
                other => ExportError::Storage(other.to_string()),
            })?;
        let content: DocumentContent = serde_json::from_slice(&raw)
            .map_err(|e| ExportError::InvalidDocument(e.to_string()))?;

        let rendered: Vec<u8> = match format {
            ExportFormat::Json => serde_json::to_vec_pretty(&content)
                .map_err(|e| ExportError::RenderFailed(e.to_string()))?,
            ExportFormat::Html => render_html(&content).into_bytes(),
            ExportFormat::Pdf => self.pdf.render(&content)?,
            ExportFormat::Docx => render_docx(&content)?,
        };

        let path = export_path(document, format);
        let size = self
            .store
            .put(&path, Bytes::from(rendered))
            .await
            .map_err(|e| ExportError::Storage(e.to_string()))?;

        tracing::debug!(path = %path, size, "Export rendered");
        Ok(ArtifactRef::new(path))
    }
}
