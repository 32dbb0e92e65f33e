// crates/core/src/transcriber/mod.rs
//! Transcription collaborator: speech-to-text over a local audio file.

mod whisper_cli;

pub use whisper_cli::WhisperCliTranscriber;

use std::path::Path;

use async_trait::async_trait;

use crate::error::TranscribeError;

/// One engine-emitted utterance span, times in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSegment {
    pub start: f64,
    pub end: Option<f64>,
    pub text: String,
}

/// Full engine output for one media file.
#[derive(Debug, Clone)]
pub struct RawTranscript {
    pub text: String,
    pub segments: Vec<RawSegment>,
}

/// Speech-to-text engine.
///
/// One synchronous call per file; the engine produces no partial output and
/// no progress signal while it runs.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<RawTranscript, TranscribeError>;

    /// Cheap readiness probe (binary present, model reachable).
    async fn health_check(&self) -> Result<(), TranscribeError>;

    /// Configured model identifier, surfaced by the health endpoint.
    fn model(&self) -> &str;
}
