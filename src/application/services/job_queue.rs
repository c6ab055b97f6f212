use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::domain::{JobId, JobRecord};

/// Ready set of jobs waiting for a worker, ordered oldest-first by
/// `created_at`. A job is held at most once.
#[derive(Default)]
pub struct JobQueue {
    ready: Mutex<BTreeSet<(DateTime<Utc>, JobId)>>,
    notify: Notify,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: &JobRecord) {
        self.push_entry(record.created_at, record.id);
    }

    pub fn push_entry(&self, created_at: DateTime<Utc>, job_id: JobId) {
        let inserted = self.lock().insert((created_at, job_id));
        if inserted {
            self.notify.notify_one();
        }
    }

    pub fn try_pop(&self) -> Option<JobId> {
        self.lock().pop_first().map(|(_, id)| id)
    }

    /// Waits until a job is ready and removes it.
    pub async fn pop(&self) -> JobId {
        loop {
            let notified = self.notify.notified();
            if let Some(id) = self.try_pop() {
                return id;
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<(DateTime<Utc>, JobId)>> {
        // The set is left consistent by every operation, so a poisoned lock is still usable.
        self.ready.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
