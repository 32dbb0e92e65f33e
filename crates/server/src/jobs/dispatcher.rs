// crates/server/src/jobs/dispatcher.rs
//! Job dispatcher: allocates an id, seeds the store, launches the worker.

use std::path::PathBuf;
use std::sync::Arc;

use podscribe_core::{MediaFetcher, Transcriber};
use uuid::Uuid;

use super::store::{JobStore, StoreError};
use super::types::JobId;
use super::worker::PipelineWorker;

/// Fresh ids to try before giving up on the never-expected collision case.
const MAX_ID_ATTEMPTS: usize = 4;

pub struct JobDispatcher {
    store: Arc<JobStore>,
    fetcher: Arc<dyn MediaFetcher>,
    transcriber: Arc<dyn Transcriber>,
    media_dir: PathBuf,
}

impl JobDispatcher {
    pub fn new(
        store: Arc<JobStore>,
        fetcher: Arc<dyn MediaFetcher>,
        transcriber: Arc<dyn Transcriber>,
        media_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            fetcher,
            transcriber,
            media_dir,
        }
    }

    /// Start a job for `url` and return its id immediately, without waiting
    /// on any pipeline stage. The caller is expected to have validated the
    /// URL already.
    pub fn submit(&self, url: &str) -> Result<JobId, StoreError> {
        let mut last_err = None;

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = generate_job_id();
            match self.store.create(&id, url) {
                Ok(()) => {
                    let worker = PipelineWorker::new(
                        Arc::clone(&self.store),
                        Arc::clone(&self.fetcher),
                        Arc::clone(&self.transcriber),
                        self.media_dir.clone(),
                    );
                    let url_owned = url.to_string();
                    let worker_id = id.clone();
                    tokio::spawn(async move {
                        worker.run(&worker_id, &url_owned).await;
                    });

                    tracing::info!(job_id = %id, %url, "job dispatched");
                    return Ok(id);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "job id collision, retrying");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| StoreError::DuplicateId(String::new())))
    }
}

/// 8 random hex characters. The space is small enough that `create` still
/// checks for collisions rather than trusting uniqueness.
fn generate_job_id() -> JobId {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_short_hex() {
        let id = generate_job_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ids_are_not_repeated() {
        let a = generate_job_id();
        let b = generate_job_id();
        assert_ne!(a, b);
    }
}
