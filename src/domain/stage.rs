use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A step in the fixed pipeline order.
///
/// Declaration order is the total order: `Received < Validating < ... < Complete`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Validating,
    Transcribing,
    Indexing,
    Generating,
    Exporting,
    Complete,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Received,
        Stage::Validating,
        Stage::Transcribing,
        Stage::Indexing,
        Stage::Generating,
        Stage::Exporting,
        Stage::Complete,
    ];

    /// Stages that have an executor behind them.
    pub const EXECUTABLE: [Stage; 5] = [
        Stage::Validating,
        Stage::Transcribing,
        Stage::Indexing,
        Stage::Generating,
        Stage::Exporting,
    ];

    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Received => Some(Stage::Validating),
            Stage::Validating => Some(Stage::Transcribing),
            Stage::Transcribing => Some(Stage::Indexing),
            Stage::Indexing => Some(Stage::Generating),
            Stage::Generating => Some(Stage::Exporting),
            Stage::Exporting => Some(Stage::Complete),
            Stage::Complete => None,
        }
    }

    pub fn is_executable(&self) -> bool {
        Self::EXECUTABLE.contains(self)
    }

    /// `Cancelled` is reachable only from stages before `Exporting`.
    pub fn is_cancellable(&self) -> bool {
        *self < Stage::Exporting
    }

    /// Coarse completion percentage reported to pollers.
    pub fn progress(&self) -> u8 {
        match self {
            Stage::Received => 0,
            Stage::Validating => 10,
            Stage::Transcribing => 25,
            Stage::Indexing => 50,
            Stage::Generating => 70,
            Stage::Exporting => 90,
            Stage::Complete => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "RECEIVED",
            Stage::Validating => "VALIDATING",
            Stage::Transcribing => "TRANSCRIBING",
            Stage::Indexing => "INDEXING",
            Stage::Generating => "GENERATING",
            Stage::Exporting => "EXPORTING",
            Stage::Complete => "COMPLETE",
        }
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RECEIVED" => Ok(Stage::Received),
            "VALIDATING" => Ok(Stage::Validating),
            "TRANSCRIBING" => Ok(Stage::Transcribing),
            "INDEXING" => Ok(Stage::Indexing),
            "GENERATING" => Ok(Stage::Generating),
            "EXPORTING" => Ok(Stage::Exporting),
            "COMPLETE" => Ok(Stage::Complete),
            _ => Err(format!("Invalid stage: {}", s)),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
