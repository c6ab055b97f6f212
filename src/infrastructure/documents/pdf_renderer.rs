use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use printpdf::{IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use ttf_parser::Face;

use crate::application::ports::ExportError;

use super::document_content::{DocumentContent, EMPTY_SECTION_TEXT};

const PAGE_WIDTH_MM: f32 = 215.9;
const PAGE_HEIGHT_MM: f32 = 279.4;
const MARGIN_MM: f32 = 25.4;
const PT_PER_MM: f32 = 72.0 / 25.4;
const LINE_SPACING: f32 = 1.4;
const LAYER_NAME: &str = "Text";

static DEJAVU_SANS: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans.ttf");
static DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans-Bold.ttf");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Title,
    Heading,
    Body,
}

impl Style {
    fn size_pt(self) -> f32 {
        match self {
            Style::Title => 18.0,
            Style::Heading => 13.0,
            Style::Body => 10.5,
        }
    }

    fn bold(self) -> bool {
        !matches!(self, Style::Body)
    }

    fn leading_mm(self) -> f32 {
        self.size_pt() * LINE_SPACING / PT_PER_MM
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("not a usable TrueType font: {0}")]
    Invalid(String),
}

/// A TrueType font program embedded into rendered PDFs.
#[derive(Clone)]
pub struct PdfFont {
    data: Arc<[u8]>,
}

impl PdfFont {
    pub fn from_bytes(data: impl Into<Arc<[u8]>>) -> Result<Self, FontError> {
        let data = data.into();
        Face::parse(&data, 0).map_err(|e| FontError::Invalid(e.to_string()))?;
        Ok(Self { data })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(data)
    }

    fn face(&self) -> Result<Face<'_>, ExportError> {
        Face::parse(&self.data, 0).map_err(|e| ExportError::RenderFailed(e.to_string()))
    }
}

/// Paged PDF output with embedded fonts. Each character is drawn with the
/// first font in the chain that has a glyph for it; a character no font
/// covers fails the render instead of being dropped.
#[derive(Clone)]
pub struct PdfRenderer {
    regular: Vec<PdfFont>,
    bold: Vec<PdfFont>,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::bundled()
    }
}

impl PdfRenderer {
    /// DejaVu Sans, which covers Latin, Greek and Cyrillic text.
    pub fn bundled() -> Self {
        Self {
            regular: vec![PdfFont {
                data: Arc::from(DEJAVU_SANS),
            }],
            bold: vec![PdfFont {
                data: Arc::from(DEJAVU_SANS_BOLD),
            }],
        }
    }

    /// Appends a font tried for both weights after the bundled ones, e.g. a
    /// CJK face.
    pub fn with_fallback(mut self, font: PdfFont) -> Self {
        self.regular.push(font.clone());
        self.bold.push(font);
        self
    }

    pub fn render(&self, content: &DocumentContent) -> Result<Vec<u8>, ExportError> {
        let regular = self
            .regular
            .iter()
            .map(PdfFont::face)
            .collect::<Result<Vec<_>, _>>()?;
        let bold = self
            .bold
            .iter()
            .map(PdfFont::face)
            .collect::<Result<Vec<_>, _>>()?;

        let max_width_pt = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM) * PT_PER_MM;
        let mut lines = Vec::new();
        for (style, text) in paragraphs(content) {
            if text.trim().is_empty() {
                lines.push(Line {
                    style,
                    runs: Vec::new(),
                });
                continue;
            }
            let shaper = Shaper {
                faces: if style.bold() { &bold } else { &regular },
                size: style.size_pt(),
            };
            for wrapped in shaper.wrap(&text, max_width_pt)? {
                lines.push(Line {
                    style,
                    runs: shaper.runs(&wrapped)?,
                });
            }
        }

        let used = |bold_style: bool| -> BTreeSet<usize> {
            lines
                .iter()
                .filter(|l| l.style.bold() == bold_style)
                .flat_map(|l| l.runs.iter().map(|r| r.font))
                .collect()
        };

        let (doc, page, layer) = PdfDocument::new(
            content.title.as_str(),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            LAYER_NAME,
        );
        let regular_refs = embed(&doc, &self.regular, &used(false))?;
        let bold_refs = embed(&doc, &self.bold, &used(true))?;

        let mut layer = doc.get_page(page).get_layer(layer);
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
        for line in &lines {
            if y - line.style.leading_mm() < MARGIN_MM {
                let (page, layer_index) =
                    doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
                layer = doc.get_page(page).get_layer(layer_index);
                y = PAGE_HEIGHT_MM - MARGIN_MM;
            }
            y -= line.style.leading_mm();

            let refs = if line.style.bold() {
                &bold_refs
            } else {
                &regular_refs
            };
            let mut x = MARGIN_MM;
            for run in &line.runs {
                let font = refs.get(run.font).and_then(Option::as_ref).ok_or_else(|| {
                    ExportError::RenderFailed(format!("font {} was not embedded", run.font))
                })?;
                layer.use_text(run.text.as_str(), line.style.size_pt(), Mm(x), Mm(y), font);
                x += run.width_pt / PT_PER_MM;
            }
        }

        doc.save_to_bytes()
            .map_err(|e| ExportError::RenderFailed(e.to_string()))
    }
}

struct Run {
    font: usize,
    text: String,
    width_pt: f32,
}

struct Line {
    style: Style,
    runs: Vec<Run>,
}

struct Shaper<'f, 'a> {
    faces: &'f [Face<'a>],
    size: f32,
}

impl Shaper<'_, '_> {
    fn font_for(&self, c: char) -> Result<usize, ExportError> {
        match self.faces.iter().position(|f| f.glyph_index(c).is_some()) {
            Some(index) => Ok(index),
            None if c.is_whitespace() => Ok(0),
            None => Err(ExportError::MissingGlyph(c)),
        }
    }

    fn advance(&self, font: usize, c: char) -> f32 {
        let Some(face) = self.faces.get(font) else {
            return 0.0;
        };
        let units = face
            .glyph_index(c)
            .and_then(|g| face.glyph_hor_advance(g))
            .unwrap_or(0);
        f32::from(units) * self.size / f32::from(face.units_per_em().max(1))
    }

    fn width(&self, text: &str) -> Result<f32, ExportError> {
        text.chars()
            .map(|c| self.font_for(c).map(|font| self.advance(font, c)))
            .sum()
    }

    /// Splits a line into runs of consecutive characters drawn with the same font.
    fn runs(&self, text: &str) -> Result<Vec<Run>, ExportError> {
        let mut runs: Vec<Run> = Vec::new();
        for c in text.chars() {
            let font = match (self.font_for(c)?, runs.last()) {
                (_, Some(last)) if c.is_whitespace() => last.font,
                (font, _) => font,
            };
            let advance = self.advance(font, c);
            match runs.last_mut() {
                Some(run) if run.font == font => {
                    run.text.push(c);
                    run.width_pt += advance;
                }
                _ => runs.push(Run {
                    font,
                    text: c.to_string(),
                    width_pt: advance,
                }),
            }
        }
        Ok(runs)
    }

    fn wrap(&self, text: &str, max_width: f32) -> Result<Vec<String>, ExportError> {
        let space = self.width(" ")?;
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0;

        for word in text.split_whitespace() {
            for piece in self.split_to_width(word, max_width)? {
                let width = self.width(&piece)?;
                if !current.is_empty() && current_width + space + width > max_width {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }
                if !current.is_empty() {
                    current.push(' ');
                    current_width += space;
                }
                current.push_str(&piece);
                current_width += width;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        Ok(lines)
    }

    /// Breaks a word wider than a line, such as unspaced CJK text, between characters.
    fn split_to_width(&self, word: &str, max_width: f32) -> Result<Vec<String>, ExportError> {
        let mut pieces = Vec::new();
        let mut piece = String::new();
        let mut width = 0.0;
        for c in word.chars() {
            let advance = self.advance(self.font_for(c)?, c);
            if !piece.is_empty() && width + advance > max_width {
                pieces.push(std::mem::take(&mut piece));
                width = 0.0;
            }
            piece.push(c);
            width += advance;
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }
        Ok(pieces)
    }
}

fn paragraphs(content: &DocumentContent) -> Vec<(Style, String)> {
    let mut paragraphs = vec![
        (Style::Title, content.title.clone()),
        (Style::Body, content.summary.clone()),
    ];
    for section in &content.sections {
        paragraphs.push((Style::Body, String::new()));
        paragraphs.push((Style::Heading, section.heading.clone()));
        if section.entries.is_empty() {
            paragraphs.push((Style::Body, EMPTY_SECTION_TEXT.to_string()));
        }
        for entry in &section.entries {
            paragraphs.push((Style::Body, content.entry_line(entry)));
        }
    }
    paragraphs
}

fn embed(
    doc: &PdfDocumentReference,
    fonts: &[PdfFont],
    used: &BTreeSet<usize>,
) -> Result<Vec<Option<IndirectFontRef>>, ExportError> {
    fonts
        .iter()
        .enumerate()
        .map(|(index, font)| {
            if !used.contains(&index) {
                return Ok(None);
            }
            doc.add_external_font(&font.data[..])
                .map(Some)
                .map_err(|e| ExportError::RenderFailed(e.to_string()))
        })
        .collect()
}
