use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    ArtifactKind, ArtifactRef, Artifacts, DocumentRequest, JobError, JobId, JobStatus, MediaRef,
    Stage,
};

/// One committed (stage, status) pair in a record's audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEntry {
    pub stage: Stage,
    pub status: JobStatus,
    pub at: DateTime<Utc>,
}

/// Durable state of one uploaded file's progress through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub stage: Stage,
    pub status: JobStatus,
    pub attempts: BTreeMap<Stage, u32>,
    pub last_error: Option<JobError>,
    pub source: MediaRef,
    pub request: DocumentRequest,
    pub artifacts: Artifacts,
    pub cancel_requested: bool,
    pub revision: u32,
    pub history: Vec<TransitionEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(source: MediaRef, request: DocumentRequest) -> Self {
        let now = Utc::now();
        let mut artifacts = Artifacts::new();
        artifacts.record(ArtifactKind::Source, ArtifactRef::new(source.as_str()));

        Self {
            id: JobId::new(),
            stage: Stage::Received,
            status: JobStatus::Pending,
            attempts: BTreeMap::new(),
            last_error: None,
            source,
            request,
            artifacts,
            cancel_requested: false,
            revision: 0,
            history: vec![TransitionEntry {
                stage: Stage::Received,
                status: JobStatus::Pending,
                at: now,
            }],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn attempts_for(&self, stage: Stage) -> u32 {
        self.attempts.get(&stage).copied().unwrap_or(0)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Claims the current stage for one executor.
    pub fn begin_attempt(&mut self) {
        *self.attempts.entry(self.stage).or_insert(0) += 1;
        self.status = JobStatus::Running;
    }

    /// Moves to the next stage, writing the stage's artifacts in the same step.
    pub fn advance(&mut self, produced: Vec<(ArtifactKind, ArtifactRef)>) {
        for (kind, reference) in produced {
            if !self.artifacts.record(kind, reference) {
                tracing::warn!(job_id = %self.id, artifact = %kind, "Artifact already recorded, keeping original");
            }
        }
        self.last_error = None;
        match self.stage.next() {
            Some(Stage::Complete) | None => {
                self.stage = Stage::Complete;
                self.status = JobStatus::Succeeded;
            }
            Some(next) => {
                self.stage = next;
                self.status = JobStatus::Pending;
            }
        }
    }

    /// Puts the current stage back in the queue after a retryable failure.
    pub fn retry(&mut self, error: JobError) {
        self.last_error = Some(error);
        self.status = JobStatus::Pending;
    }

    pub fn fail(&mut self, error: JobError) {
        self.last_error = Some(error);
        self.status = JobStatus::Failed;
    }

    pub fn cancel(&mut self) {
        self.status = JobStatus::Cancelled;
    }

    /// Operator-initiated reset: starts a new revision at `from_stage`,
    /// superseding artifacts that stage and later stages produced.
    pub fn reset_for_reprocess(&mut self, from_stage: Stage) {
        self.artifacts.supersede_from(from_stage, self.revision);
        self.revision += 1;
        self.attempts.retain(|stage, _| *stage < from_stage);
        self.stage = from_stage;
        self.status = JobStatus::Pending;
        self.last_error = None;
        self.cancel_requested = false;
    }

    /// Stamps a committed mutation. Called by job stores after a successful
    /// compare-and-transition.
    pub fn stamp(&mut self, previous_stage: Stage, previous_status: JobStatus) {
        let now = Utc::now();
        self.updated_at = now;
        if self.stage != previous_stage || self.status != previous_status {
            self.history.push(TransitionEntry {
                stage: self.stage,
                status: self.status,
                at: now,
            });
        }
    }
}
