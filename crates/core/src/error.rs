// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the media-fetch collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("download failed: {stderr}")]
    Download { stderr: String },

    #[error("could not parse downloader metadata: {message}")]
    Metadata { message: String },
}

/// Errors from the transcription collaborator.
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transcription engine failed: {stderr}")]
    Engine { stderr: String },

    #[error("transcription output not found: {path}")]
    MissingOutput { path: PathBuf },

    #[error("could not parse transcription output {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("model not available: {0}")]
    ModelUnavailable(String),
}
