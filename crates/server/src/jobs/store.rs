// crates/server/src/jobs/store.rs
//! In-memory job record store.
//!
//! A single `RwLock` over the whole map: correctness over throughput, since
//! job counts are small and a job is updated at most every couple of
//! seconds. Each entry carries a `watch` channel publishing the latest
//! snapshot so observers are notified of changes without polling. The lock
//! is never held across an await.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;

use super::types::{Job, JobId, JobSnapshot, JobStatus, JobUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A freshly generated id is already present. Ids are generated
    /// internally, so this is an invariant violation, not user input.
    #[error("job id already exists: {0}")]
    DuplicateId(JobId),
}

struct JobEntry {
    job: Job,
    snapshot_tx: watch::Sender<JobSnapshot>,
}

/// Concurrent key-value store for job records.
///
/// One writer (the job's worker) and any number of readers (streamers) per
/// job; all access goes through `create`/`update`/`get`/`subscribe`.
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, JobEntry>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a new pending record. Fails if the id is already taken.
    pub fn create(&self, id: &str, url: &str) -> Result<(), StoreError> {
        let mut jobs = self.write_guard();
        if jobs.contains_key(id) {
            return Err(StoreError::DuplicateId(id.to_string()));
        }

        let job = Job::new(id.to_string(), url.to_string());
        let (snapshot_tx, _) = watch::channel(job.snapshot());
        jobs.insert(id.to_string(), JobEntry { job, snapshot_tx });
        Ok(())
    }

    /// Apply a partial update atomically and publish the new snapshot.
    ///
    /// Invariants are enforced here rather than trusted from callers:
    /// terminal states are frozen, progress never decreases, and
    /// `result`/`error` can only land alongside their terminal status, once.
    /// Returns false when nothing was applied (unknown id, frozen record, or
    /// an illegal transition).
    pub fn update(&self, id: &str, update: JobUpdate) -> bool {
        let mut jobs = self.write_guard();
        let Some(entry) = jobs.get_mut(id) else {
            return false;
        };
        let job = &mut entry.job;

        if job.status.is_terminal() {
            tracing::warn!(job_id = %id, status = ?job.status, "update after terminal state dropped");
            return false;
        }

        if let Some(status) = update.status {
            if !job.status.allows(status) {
                tracing::warn!(
                    job_id = %id,
                    from = ?job.status,
                    to = ?status,
                    "illegal status transition dropped"
                );
                return false;
            }
            job.status = status;
            if status.is_terminal() {
                job.finished_at = Some(Utc::now());
            }
        }

        if let Some(progress) = update.progress {
            job.progress = job.progress.max(progress.min(100));
        }
        if let Some(message) = update.message {
            job.message = message;
        }
        if let Some(result) = update.result {
            if job.status == JobStatus::Completed && job.result.is_none() && job.error.is_none() {
                job.result = Some(result);
            }
        }
        if let Some(error) = update.error {
            if job.status == JobStatus::Failed && job.error.is_none() && job.result.is_none() {
                job.error = Some(error);
            }
        }

        // send_replace stores the value even with no receivers attached, so
        // a streamer that subscribes later still starts from current state.
        let _ = entry.snapshot_tx.send_replace(job.snapshot());
        true
    }

    /// Current record for a job, if any.
    pub fn get(&self, id: &str) -> Option<Job> {
        self.read_guard().get(id).map(|entry| entry.job.clone())
    }

    /// Subscribe to snapshot changes for a job. `None` for unknown ids.
    pub fn subscribe(&self, id: &str) -> Option<watch::Receiver<JobSnapshot>> {
        self.read_guard()
            .get(id)
            .map(|entry| entry.snapshot_tx.subscribe())
    }

    /// Evict terminal jobs that finished before `cutoff`. Dropping an entry
    /// closes its snapshot channel, ending any attached stream silently.
    pub fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.write_guard();
        let before = jobs.len();
        jobs.retain(|_, entry| {
            !(entry.job.status.is_terminal()
                && entry.job.finished_at.is_some_and(|t| t < cutoff))
        });
        before - jobs.len()
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, HashMap<JobId, JobEntry>> {
        match self.jobs.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("jobs map lock poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, HashMap<JobId, JobEntry>> {
        match self.jobs.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("jobs map lock poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
