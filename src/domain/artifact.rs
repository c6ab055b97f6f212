use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ExportFormat, Stage};

/// Name of an output retained on a job record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ArtifactKind {
    Source,
    Transcript,
    TranscriptIndex,
    Document,
    Export(ExportFormat),
}

impl ArtifactKind {
    /// The stage whose successful completion writes this artifact.
    pub fn produced_by(&self) -> Stage {
        match self {
            ArtifactKind::Source => Stage::Received,
            ArtifactKind::Transcript => Stage::Transcribing,
            ArtifactKind::TranscriptIndex => Stage::Indexing,
            ArtifactKind::Document => Stage::Generating,
            ArtifactKind::Export(_) => Stage::Exporting,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Source => f.write_str("source"),
            ArtifactKind::Transcript => f.write_str("transcript"),
            ArtifactKind::TranscriptIndex => f.write_str("transcript_index"),
            ArtifactKind::Document => f.write_str("document"),
            ArtifactKind::Export(format) => write!(f, "export:{}", format),
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(ArtifactKind::Source),
            "transcript" => Ok(ArtifactKind::Transcript),
            "transcript_index" => Ok(ArtifactKind::TranscriptIndex),
            "document" => Ok(ArtifactKind::Document),
            other => match other.strip_prefix("export:") {
                Some(format) => format.parse().map(ArtifactKind::Export),
                None => Err(format!("Invalid artifact kind: {}", other)),
            },
        }
    }
}

impl From<ArtifactKind> for String {
    fn from(kind: ArtifactKind) -> Self {
        kind.to_string()
    }
}

impl TryFrom<String> for ArtifactKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Opaque reference to stored content (a path in the artifact store).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupersededArtifact {
    pub revision: u32,
    pub kind: ArtifactKind,
    pub reference: ArtifactRef,
}

/// Append-only mapping of artifact kind to reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    entries: BTreeMap<ArtifactKind, ArtifactRef>,
    #[serde(default)]
    superseded: Vec<SupersededArtifact>,
}

impl Artifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an artifact. An existing entry is never overwritten; returns
    /// `false` when `kind` was already present.
    pub fn record(&mut self, kind: ArtifactKind, reference: ArtifactRef) -> bool {
        if self.entries.contains_key(&kind) {
            return false;
        }
        self.entries.insert(kind, reference);
        true
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&ArtifactRef> {
        self.entries.get(&kind)
    }

    pub fn export(&self, format: ExportFormat) -> Option<&ArtifactRef> {
        self.get(ArtifactKind::Export(format))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArtifactKind, &ArtifactRef)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn superseded(&self) -> &[SupersededArtifact] {
        &self.superseded
    }

    /// Moves every live artifact produced at or after `stage` into the
    /// superseded list, tagged with the revision that produced it.
    pub fn supersede_from(&mut self, stage: Stage, revision: u32) {
        let stale: Vec<ArtifactKind> = self
            .entries
            .keys()
            .filter(|kind| kind.produced_by() >= stage)
            .copied()
            .collect();

        for kind in stale {
            if let Some(reference) = self.entries.remove(&kind) {
                self.superseded.push(SupersededArtifact {
                    revision,
                    kind,
                    reference,
                });
            }
        }
    }
}
