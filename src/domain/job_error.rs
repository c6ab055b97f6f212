use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Stage;

/// Classifies a stage failure for the retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Bad input. Retrying cannot fix it.
    Validation,
    /// Collaborator failed in a way that may succeed on another attempt.
    Transient,
    /// Collaborator did not answer within the stage timeout.
    Timeout,
    /// A race guard or data-shape check tripped (already indexed, wrong
    /// embedding size, a character no PDF font can draw).
    Integrity,
}

impl FailureKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::Transient | FailureKind::Timeout)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::Transient => "transient",
            FailureKind::Timeout => "timeout",
            FailureKind::Integrity => "integrity",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structured error retained on a job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobError {
    pub stage: Stage,
    pub kind: FailureKind,
    pub message: String,
    pub attempt: u32,
    pub occurred_at: DateTime<Utc>,
}

impl JobError {
    pub fn new(stage: Stage, kind: FailureKind, message: impl Into<String>, attempt: u32) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
            attempt,
            occurred_at: Utc::now(),
        }
    }

    /// Human-readable one-liner for status pollers.
    pub fn summary(&self) -> String {
        format!(
            "{} failed ({}, attempt {}): {}",
            self.stage, self.kind, self.attempt, self.message
        )
    }
}
