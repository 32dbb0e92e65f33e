// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use podscribe_core::{MediaFetcher, Transcriber};

use crate::config::Config;
use crate::jobs::{JobDispatcher, JobStore};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    pub config: Config,
    /// Job record store, shared between the dispatcher's workers and the
    /// progress streamers.
    pub store: Arc<JobStore>,
    pub dispatcher: JobDispatcher,
    /// Whether the transcription engine answered its startup probe.
    pub model_loaded: bool,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(
        config: Config,
        fetcher: Arc<dyn MediaFetcher>,
        transcriber: Arc<dyn Transcriber>,
        model_loaded: bool,
    ) -> Arc<Self> {
        let store = Arc::new(JobStore::new());
        let dispatcher = JobDispatcher::new(
            Arc::clone(&store),
            fetcher,
            transcriber,
            config.media_dir.clone(),
        );

        Arc::new(Self {
            start_time: Instant::now(),
            config,
            store,
            dispatcher,
            model_loaded,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
