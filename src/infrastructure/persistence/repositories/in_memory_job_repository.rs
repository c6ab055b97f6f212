use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::application::ports::{JobMutation, JobRepository, RepositoryError};
use crate::domain::{JobId, JobRecord, JobStatus, Stage};

type Slot = Arc<Mutex<JobRecord>>;

/// Process-local job store. Each record sits behind its own lock, so
/// transitions on different jobs never contend, and a lock is only held for
/// the in-memory edit itself.
#[derive(Default)]
pub struct InMemoryJobRepository {
    records: DashMap<JobId, Slot>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: JobId) -> Result<Slot, RepositoryError> {
        self.records
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(RepositoryError::NotFound(id))
    }
}

fn lock(slot: &Slot) -> MutexGuard<'_, JobRecord> {
    // Mutations are applied to a copy and swapped in whole, so the guarded
    // record is always a committed version even after a panic.
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, record: &JobRecord) -> Result<(), RepositoryError> {
        match self.records.entry(record.id) {
            Entry::Occupied(_) => Err(RepositoryError::ConstraintViolation(format!(
                "job {} already exists",
                record.id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(record.clone())));
                Ok(())
            }
        }
    }

    async fn get(&self, id: JobId) -> Result<JobRecord, RepositoryError> {
        let slot = self.slot(id)?;
        let record = lock(&slot).clone();
        Ok(record)
    }

    async fn compare_and_transition(
        &self,
        id: JobId,
        expected_stage: Stage,
        expected_status: JobStatus,
        mutation: JobMutation,
    ) -> Result<JobRecord, RepositoryError> {
        let slot = self.slot(id)?;
        let mut current = lock(&slot);

        if current.stage != expected_stage || current.status != expected_status {
            return Err(RepositoryError::Conflict {
                id,
                expected_stage,
                expected_status,
                actual_stage: current.stage,
                actual_status: current.status,
            });
        }

        let mut next = current.clone();
        mutation(&mut next);
        next.stamp(expected_stage, expected_status);
        *current = next.clone();

        Ok(next)
    }

    async fn list_active(&self) -> Result<Vec<JobRecord>, RepositoryError> {
        let slots: Vec<Slot> = self
            .records
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut active: Vec<JobRecord> = slots
            .iter()
            .map(|slot| lock(slot).clone())
            .filter(|record| !record.is_terminal() && record.stage != Stage::Complete)
            .collect();
        active.sort_by_key(|record| (record.created_at, record.id));
        Ok(active)
    }
}
