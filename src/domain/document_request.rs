use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ExportFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    /// Business requirements document.
    #[default]
    Brd,
    /// Statement of work.
    Sow,
    /// Functional requirements document.
    Frd,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Brd => "BRD",
            DocumentType::Sow => "SOW",
            DocumentType::Frd => "FRD",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DocumentType::Brd => "Business Requirements Document",
            DocumentType::Sow => "Statement of Work",
            DocumentType::Frd => "Functional Requirements Document",
        }
    }

    /// Section headings, each doubling as the retrieval topic for that section.
    pub fn sections(&self) -> &'static [&'static str] {
        match self {
            DocumentType::Brd => &[
                "Project background and business objectives",
                "Stakeholders and users",
                "Business requirements",
                "Constraints, assumptions and risks",
                "Success criteria",
            ],
            DocumentType::Sow => &[
                "Project scope",
                "Deliverables",
                "Timeline and milestones",
                "Roles and responsibilities",
                "Acceptance criteria",
            ],
            DocumentType::Frd => &[
                "System overview",
                "Functional requirements",
                "User interactions and workflows",
                "Data and integrations",
                "Non-functional requirements",
            ],
        }
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BRD" => Ok(DocumentType::Brd),
            "SOW" => Ok(DocumentType::Sow),
            "FRD" => Ok(DocumentType::Frd),
            other => Err(format!(
                "Invalid document type: {}. Expected: BRD, SOW, or FRD",
                other
            )),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentLevel {
    Simple,
    #[default]
    Intermediate,
    Advanced,
}

impl DocumentLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentLevel::Simple => "Simple",
            DocumentLevel::Intermediate => "Intermediate",
            DocumentLevel::Advanced => "Advanced",
        }
    }

    /// Multiplier applied to the retrieval depth of each section.
    pub fn depth_factor(&self) -> usize {
        match self {
            DocumentLevel::Simple => 1,
            DocumentLevel::Intermediate => 2,
            DocumentLevel::Advanced => 3,
        }
    }
}

impl FromStr for DocumentLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(DocumentLevel::Simple),
            "intermediate" => Ok(DocumentLevel::Intermediate),
            "advanced" => Ok(DocumentLevel::Advanced),
            other => Err(format!(
                "Invalid documentation level: {}. Expected: Simple, Intermediate, or Advanced",
                other
            )),
        }
    }
}

impl fmt::Display for DocumentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller asked the pipeline to produce for one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub doc_type: DocumentType,
    pub doc_level: DocumentLevel,
    pub formats: BTreeSet<ExportFormat>,
}

impl DocumentRequest {
    pub fn new(
        doc_type: DocumentType,
        doc_level: DocumentLevel,
        formats: impl IntoIterator<Item = ExportFormat>,
    ) -> Self {
        let mut formats: BTreeSet<ExportFormat> = formats.into_iter().collect();
        if formats.is_empty() {
            formats.extend(ExportFormat::DEFAULT);
        }
        Self {
            doc_type,
            doc_level,
            formats,
        }
    }
}

impl Default for DocumentRequest {
    fn default() -> Self {
        Self::new(DocumentType::default(), DocumentLevel::default(), [])
    }
}
