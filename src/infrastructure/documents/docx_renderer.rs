use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Run};

use crate::application::ports::ExportError;

use super::document_content::{DocumentContent, EMPTY_SECTION_TEXT};

// Sizes are in half-points.
const TITLE_SIZE: usize = 36;
const HEADING_SIZE: usize = 26;
const BODY_SIZE: usize = 22;

fn paragraph(text: &str, size: usize, bold: bool) -> Paragraph {
    let run = Run::new().add_text(text).size(size);
    Paragraph::new().add_run(if bold { run.bold() } else { run })
}

pub fn render_docx(content: &DocumentContent) -> Result<Vec<u8>, ExportError> {
    let mut docx = Docx::new()
        .add_paragraph(paragraph(&content.title, TITLE_SIZE, true))
        .add_paragraph(paragraph(&content.summary, BODY_SIZE, false));

    for section in &content.sections {
        docx = docx.add_paragraph(paragraph(&section.heading, HEADING_SIZE, true));
        if section.entries.is_empty() {
            docx = docx.add_paragraph(paragraph(EMPTY_SECTION_TEXT, BODY_SIZE, false));
        }
        for entry in &section.entries {
            docx = docx.add_paragraph(paragraph(&content.entry_line(entry), BODY_SIZE, false));
        }
    }

    let mut out = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut out)
        .map_err(|e| ExportError::RenderFailed(e.to_string()))?;
    Ok(out.into_inner())
}
