// crates/core/src/fetcher/ytdlp.rs
//! yt-dlp fetcher — spawns the `yt-dlp` binary and parses its JSON metadata.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{FetchedMedia, MediaFetcher};
use crate::error::FetchError;

/// Fallback title when the extractor reports none.
const UNKNOWN_TITLE: &str = "Unknown Episode";

/// Media fetcher backed by the `yt-dlp` CLI.
///
/// Handles direct audio links and podcast/episode pages alike: the audio
/// stream is extracted and converted to mp3 at the destination prefix, and
/// the `--dump-single-json` metadata on stdout yields title and duration.
pub struct YtDlpFetcher {
    binary: String,
}

impl YtDlpFetcher {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, dest_prefix: &Path) -> Result<FetchedMedia, FetchError> {
        let output_template = format!("{}.%(ext)s", dest_prefix.display());

        tracing::info!(%url, binary = %self.binary, "yt-dlp: starting download");
        let t0 = std::time::Instant::now();

        let output = Command::new(&self.binary)
            .args([
                "--no-playlist",
                "-x",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "192K",
                "--no-simulate",
                "--dump-single-json",
                "-o",
                &output_template,
                url,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "yt-dlp: failed to spawn");
                FetchError::Spawn {
                    binary: self.binary.clone(),
                    source: e,
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(
                %url,
                exit_code = ?output.status.code(),
                stderr = %stderr,
                "yt-dlp: download failed"
            );
            return Err(FetchError::Download { stderr });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let info: serde_json::Value =
            serde_json::from_str(&stdout).map_err(|e| FetchError::Metadata {
                message: format!("invalid metadata JSON: {e}"),
            })?;

        let title = info
            .get("title")
            .and_then(serde_json::Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNKNOWN_TITLE)
            .to_string();
        let duration_seconds = info.get("duration").and_then(serde_json::Value::as_f64);

        tracing::info!(
            %url,
            %title,
            ?duration_seconds,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "yt-dlp: download complete"
        );

        Ok(FetchedMedia {
            title,
            duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_failure_maps_to_fetch_error() {
        let fetcher = YtDlpFetcher::new("definitely-not-a-real-binary-7f3a");
        let dir = tempfile::tempdir().unwrap();

        let err = fetcher
            .fetch("https://example.com/ep.mp3", &dir.path().join("job1"))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Spawn { .. }));
    }

    #[tokio::test]
    async fn nonzero_exit_maps_to_download_error() {
        // `false` exits 1 with no output, standing in for a failed download.
        let fetcher = YtDlpFetcher::new("false");
        let dir = tempfile::tempdir().unwrap();

        let err = fetcher
            .fetch("https://example.com/ep.mp3", &dir.path().join("job1"))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Download { .. }));
    }
}
