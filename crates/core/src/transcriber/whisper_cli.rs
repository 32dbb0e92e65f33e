// crates/core/src/transcriber/whisper_cli.rs
//! whisper.cpp transcriber — spawns `whisper-cli` and parses its JSON artifact.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use super::{RawSegment, RawTranscript, Transcriber};
use crate::error::TranscribeError;

/// Transcriber backed by the whisper.cpp `whisper-cli` binary.
///
/// The engine is invoked with `-oj -of <prefix>`, which writes a
/// `<prefix>.json` artifact next to the audio file; the artifact is parsed
/// and then removed.
pub struct WhisperCliTranscriber {
    binary: String,
    model_path: PathBuf,
    model_name: String,
}

impl WhisperCliTranscriber {
    pub fn new(
        binary: impl Into<String>,
        model_path: impl Into<PathBuf>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            model_path: model_path.into(),
            model_name: model_name.into(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<RawTranscript, TranscribeError> {
        let output_prefix = audio_path.with_extension("");
        let json_path = PathBuf::from(format!("{}.json", output_prefix.display()));

        tracing::info!(
            audio = %audio_path.display(),
            model = %self.model_name,
            "whisper: starting transcription"
        );
        let t0 = std::time::Instant::now();

        let output = Command::new(&self.binary)
            .arg("-f")
            .arg(audio_path)
            .arg("-m")
            .arg(&self.model_path)
            .arg("-of")
            .arg(&output_prefix)
            .arg("-oj")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "whisper: failed to spawn");
                TranscribeError::Spawn {
                    binary: self.binary.clone(),
                    source: e,
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(
                exit_code = ?output.status.code(),
                stderr = %stderr,
                "whisper: engine failed"
            );
            return Err(TranscribeError::Engine { stderr });
        }

        let raw_json = tokio::fs::read_to_string(&json_path).await.map_err(|_| {
            TranscribeError::MissingOutput {
                path: json_path.clone(),
            }
        })?;
        let root: Value = serde_json::from_str(&raw_json).map_err(|e| TranscribeError::Parse {
            path: json_path.clone(),
            message: e.to_string(),
        })?;

        // The artifact has served its purpose once parsed.
        if let Err(e) = tokio::fs::remove_file(&json_path).await {
            tracing::warn!(path = %json_path.display(), error = %e, "failed to remove transcript artifact");
        }

        let segments = extract_segments(&root);
        let text = root
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| text_from_segments(&segments));

        tracing::info!(
            segment_count = segments.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "whisper: transcription complete"
        );

        Ok(RawTranscript { text, segments })
    }

    async fn health_check(&self) -> Result<(), TranscribeError> {
        if !self.model_path.exists() {
            return Err(TranscribeError::ModelUnavailable(format!(
                "model file missing: {}",
                self.model_path.display()
            )));
        }

        // Exit status is ignored: some builds print usage with a non-zero
        // code, and all we need to know here is that the binary runs.
        Command::new(&self.binary)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| TranscribeError::Spawn {
                binary: self.binary.clone(),
                source: e,
            })?;

        Ok(())
    }

    fn model(&self) -> &str {
        &self.model_name
    }
}

/// Extract utterance spans from the engine's JSON artifact.
///
/// whisper.cpp emits a `transcription` array with millisecond `offsets`;
/// other whisper-family tools emit a `segments` array with second-valued
/// `start`/`end` fields. Both shapes are accepted.
fn extract_segments(root: &Value) -> Vec<RawSegment> {
    if let Some(items) = root.get("transcription").and_then(Value::as_array) {
        return items
            .iter()
            .filter_map(|node| {
                let start = node.pointer("/offsets/from")?.as_f64()? / 1000.0;
                let end = node
                    .pointer("/offsets/to")
                    .and_then(Value::as_f64)
                    .map(|ms| ms / 1000.0);
                let text = node.get("text")?.as_str()?.to_string();
                Some(RawSegment { start, end, text })
            })
            .collect();
    }

    if let Some(items) = root.get("segments").and_then(Value::as_array) {
        return items
            .iter()
            .filter_map(|node| {
                let start = node.get("start")?.as_f64()?;
                let end = node.get("end").and_then(Value::as_f64);
                let text = node.get("text")?.as_str()?.to_string();
                Some(RawSegment { start, end, text })
            })
            .collect();
    }

    Vec::new()
}

fn text_from_segments(segments: &[RawSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
