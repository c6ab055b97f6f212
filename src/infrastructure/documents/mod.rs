mod document_content;
mod docx_renderer;
mod html_renderer;
mod local_exporter;
mod pdf_renderer;
mod transcript_document_generator;

pub use document_content::{DocumentContent, DocumentSection, SectionEntry, format_timestamp};
pub use docx_renderer::render_docx;
pub use html_renderer::render_html;
pub use local_exporter::LocalExporter;
pub use pdf_renderer::{FontError, PdfFont, PdfRenderer};
pub use transcript_document_generator::TranscriptDocumentGenerator;
