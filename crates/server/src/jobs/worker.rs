// crates/server/src/jobs/worker.rs
//! Pipeline worker: drives one job through fetch → locate → transcribe →
//! format, reporting stage transitions and progress into the job store.
//!
//! The worker is the only writer for its job. Errors never escape: every
//! stage failure becomes the job's terminal `failed` state, and staged media
//! is cleaned up on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use podscribe_core::{
    buffered_expected_secs, estimate_transcribe_progress, format_segments, locate_media_file,
    MediaFetcher, RawTranscript, Transcriber, TranscriptResult, ESTIMATE_INTERVAL,
    MEDIA_EXTENSIONS,
};

use super::store::JobStore;
use super::types::{JobStatus, JobUpdate};

/// A stage failure: what the user sees, and what actually happened.
struct StageFailure {
    message: &'static str,
    cause: String,
}

pub struct PipelineWorker {
    store: Arc<JobStore>,
    fetcher: Arc<dyn MediaFetcher>,
    transcriber: Arc<dyn Transcriber>,
    media_dir: PathBuf,
}

impl PipelineWorker {
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

    /// Drive one job to a terminal state.
    pub async fn run(&self, job_id: &str, url: &str) {
        let prefix = self.media_dir.join(job_id);

        if let Err(failure) = self.run_pipeline(job_id, url, &prefix).await {
            tracing::error!(job_id, error = %failure.cause, "pipeline failed");
            self.store
                .update(job_id, JobUpdate::failed(failure.message, failure.cause));
        }

        cleanup_staged_media(&prefix).await;
    }

    async fn run_pipeline(
        &self,
        job_id: &str,
        url: &str,
        prefix: &Path,
    ) -> Result<(), StageFailure> {
        self.store.update(
            job_id,
            JobUpdate::stage(JobStatus::Downloading, 10, "Downloading audio..."),
        );
        let media = self
            .fetcher
            .fetch(url, prefix)
            .await
            .map_err(|e| StageFailure {
                message: "Audio download failed",
                cause: e.to_string(),
            })?;
        tracing::info!(
            job_id,
            title = %media.title,
            duration_seconds = ?media.duration_seconds,
            "download complete"
        );

        self.store.update(
            job_id,
            JobUpdate::stage(
                JobStatus::Processing,
                25,
                "Preparing audio for transcription...",
            ),
        );
        let audio_path = locate_media_file(prefix).ok_or_else(|| StageFailure {
            message: "Downloaded audio file not found",
            cause: format!(
                "no staged media at {} with extensions {:?}",
                prefix.display(),
                MEDIA_EXTENSIONS
            ),
        })?;

        self.store.update(
            job_id,
            JobUpdate::stage(JobStatus::Transcribing, 30, "Transcribing audio..."),
        );
        let raw = self
            .transcribe_with_progress(job_id, &audio_path, media.duration_seconds)
            .await?;

        self.store.update(
            job_id,
            JobUpdate::stage(JobStatus::Formatting, 90, "Formatting transcript..."),
        );
        let transcript = format_segments(&raw.segments);
        let full_text = raw.text.trim().to_string();
        tracing::info!(job_id, segment_count = transcript.len(), "job complete");

        self.store.update(
            job_id,
            JobUpdate::completed(TranscriptResult {
                title: media.title,
                transcript,
                full_text,
            }),
        );
        Ok(())
    }

    /// Run the engine on its own task while a ticker extrapolates progress.
    ///
    /// Only this loop writes progress; the engine task signals completion
    /// solely through its join handle, so the estimate can never race the
    /// final result.
    async fn transcribe_with_progress(
        &self,
        job_id: &str,
        audio_path: &Path,
        duration_seconds: Option<f64>,
    ) -> Result<RawTranscript, StageFailure> {
        let expected_secs = buffered_expected_secs(duration_seconds);
        let transcriber = Arc::clone(&self.transcriber);
        let path = audio_path.to_path_buf();
        let mut call = tokio::spawn(async move { transcriber.transcribe(&path).await });

        let started = Instant::now();
        let mut ticker = tokio::time::interval(ESTIMATE_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                joined = &mut call => {
                    return match joined {
                        Ok(Ok(raw)) => Ok(raw),
                        Ok(Err(e)) => Err(StageFailure {
                            message: "Transcription failed",
                            cause: e.to_string(),
                        }),
                        Err(e) => Err(StageFailure {
                            message: "Transcription failed",
                            cause: format!("engine task aborted: {e}"),
                        }),
                    };
                }
                _ = ticker.tick() => {
                    let elapsed = started.elapsed().as_secs_f64();
                    let pct = estimate_transcribe_progress(elapsed, expected_secs);
                    self.store.update(
                        job_id,
                        JobUpdate::tick(
                            pct,
                            format!("Transcribing... ({}s elapsed)", elapsed as u64),
                        ),
                    );
                }
            }
        }
    }
}

/// Remove all staged files for a job prefix. Logs, never propagates.
async fn cleanup_staged_media(prefix: &Path) {
    for ext in MEDIA_EXTENSIONS {
        let candidate = prefix.with_extension(ext);
        match tokio::fs::remove_file(&candidate).await {
            Ok(()) => tracing::debug!(path = %candidate.display(), "removed staged media"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %candidate.display(), error = %e, "failed to remove staged media");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use podscribe_core::{FetchError, FetchedMedia, RawSegment, TranscribeError};

    const URL: &str = "https://example.com/ep.mp3";

    /// Fetcher that stages a file (or doesn't) and reports fixed metadata.
    struct FakeFetcher {
        stage_file: bool,
        fail: bool,
    }

    #[async_trait]
    impl MediaFetcher for FakeFetcher {
        async fn fetch(
            &self,
            _url: &str,
            dest_prefix: &Path,
        ) -> Result<FetchedMedia, FetchError> {
            if self.fail {
                return Err(FetchError::Download {
                    stderr: "404 Not Found".to_string(),
                });
            }
            if self.stage_file {
                std::fs::write(dest_prefix.with_extension("mp3"), b"audio").unwrap();
            }
            Ok(FetchedMedia {
                title: "Test Episode".to_string(),
                duration_seconds: Some(90.0),
            })
        }
    }

    /// Engine that returns a fixed transcript, or fails.
    struct FakeTranscriber {
        fail: bool,
    }

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<RawTranscript, TranscribeError> {
            if self.fail {
                return Err(TranscribeError::Engine {
                    stderr: "unreadable input".to_string(),
                });
            }
            Ok(RawTranscript {
                text: " hello world ".to_string(),
                segments: vec![
                    RawSegment {
                        start: 0.0,
                        end: Some(2.0),
                        text: " hello ".to_string(),
                    },
                    RawSegment {
                        start: 2.0,
                        end: Some(4.0),
                        text: " world ".to_string(),
                    },
                ],
            })
        }

        async fn health_check(&self) -> Result<(), TranscribeError> {
            Ok(())
        }

        fn model(&self) -> &str {
            "fake"
        }
    }

    fn worker(
        store: &Arc<JobStore>,
        media_dir: &Path,
        fetcher: FakeFetcher,
        transcriber: FakeTranscriber,
    ) -> PipelineWorker {
        PipelineWorker::new(
            Arc::clone(store),
            Arc::new(fetcher),
            Arc::new(transcriber),
            media_dir.to_path_buf(),
        )
    }

    #[tokio::test]
    async fn happy_path_completes_with_result() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JobStore::new());
        store.create("job1", URL).unwrap();

        let w = worker(
            &store,
            dir.path(),
            FakeFetcher {
                stage_file: true,
                fail: false,
            },
            FakeTranscriber { fail: false },
        );
        w.run("job1", URL).await;

        let job = store.get("job1").unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.error.is_none());

        let result = job.result.expect("result present");
        assert_eq!(result.title, "Test Episode");
        assert_eq!(result.full_text, "hello world");
        assert_eq!(result.transcript.len(), 2);
        assert_eq!(result.transcript[0].text, "hello");
        assert_eq!(result.transcript[0].timestamp, "00:00");

        // Staged media is gone.
        assert!(!dir.path().join("job1.mp3").exists());
    }

    #[tokio::test]
    async fn fetch_failure_fails_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JobStore::new());
        store.create("job1", URL).unwrap();

        let w = worker(
            &store,
            dir.path(),
            FakeFetcher {
                stage_file: false,
                fail: true,
            },
            FakeTranscriber { fail: false },
        );
        w.run("job1", URL).await;

        let job = store.get("job1").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.message, "Audio download failed");
        assert!(job.error.unwrap().contains("404"));
        assert!(job.result.is_none());
    }

    #[tokio::test]
    async fn missing_staged_file_fails_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JobStore::new());
        store.create("job1", URL).unwrap();

        let w = worker(
            &store,
            dir.path(),
            FakeFetcher {
                stage_file: false,
                fail: false,
            },
            FakeTranscriber { fail: false },
        );
        w.run("job1", URL).await;

        let job = store.get("job1").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.message, "Downloaded audio file not found");
    }

    #[tokio::test]
    async fn engine_failure_fails_the_job_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JobStore::new());
        store.create("job1", URL).unwrap();

        let w = worker(
            &store,
            dir.path(),
            FakeFetcher {
                stage_file: true,
                fail: false,
            },
            FakeTranscriber { fail: true },
        );
        w.run("job1", URL).await;

        let job = store.get("job1").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.message, "Transcription failed");
        assert!(job.error.unwrap().contains("unreadable input"));
        // Cleanup ran on the failure path too.
        assert!(!dir.path().join("job1.mp3").exists());
    }

    #[tokio::test]
    async fn stages_progress_monotonically() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JobStore::new());
        store.create("job1", URL).unwrap();
        let mut rx = store.subscribe("job1").unwrap();

        let w = worker(
            &store,
            dir.path(),
            FakeFetcher {
                stage_file: true,
                fail: false,
            },
            FakeTranscriber { fail: false },
        );
        let run = tokio::spawn(async move { w.run("job1", URL).await });

        let mut last_progress = 0u8;
        let mut statuses = vec![];
        loop {
            if rx.changed().await.is_err() {
                break;
            }
            let snap = rx.borrow_and_update().clone();
            assert!(
                snap.progress >= last_progress,
                "progress went backwards: {} -> {}",
                last_progress,
                snap.progress
            );
            last_progress = snap.progress;
            if statuses.last() != Some(&snap.status) {
                statuses.push(snap.status);
            }
            if snap.status.is_terminal() {
                break;
            }
        }
        run.await.unwrap();

        assert_eq!(*statuses.last().unwrap(), JobStatus::Completed);
        assert_eq!(last_progress, 100);
        // Watch receivers may skip intermediate values but the stage order
        // of whatever was observed must match the pipeline.
        let ranks: Vec<usize> = statuses
            .iter()
            .map(|s| match s {
                JobStatus::Pending => 0,
                JobStatus::Downloading => 1,
                JobStatus::Processing => 2,
                JobStatus::Transcribing => 3,
                JobStatus::Formatting => 4,
                JobStatus::Completed | JobStatus::Failed => 5,
            })
            .collect();
        let mut sorted = ranks.clone();
        sorted.sort_unstable();
        assert_eq!(ranks, sorted, "stages observed out of order: {statuses:?}");
    }
}
