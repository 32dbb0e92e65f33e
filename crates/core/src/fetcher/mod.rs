// crates/core/src/fetcher/mod.rs
//! Media-fetch collaborator: downloads remote media into local staging.

mod ytdlp;

pub use ytdlp::YtDlpFetcher;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::FetchError;

/// Container extensions the downloader is known to produce.
pub const MEDIA_EXTENSIONS: [&str; 3] = ["mp3", "m4a", "wav"];

/// Metadata captured from a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub title: String,
    /// Source duration in seconds, when the extractor reports one.
    pub duration_seconds: Option<f64>,
}

/// Downloads remote media to local staging storage.
///
/// Implementations stage the audio at `dest_prefix` plus one of
/// [`MEDIA_EXTENSIONS`]; callers discover the actual file with
/// [`locate_media_file`].
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest_prefix: &Path) -> Result<FetchedMedia, FetchError>;
}

/// Find the staged audio file for `dest_prefix` by probing known extensions.
pub fn locate_media_file(dest_prefix: &Path) -> Option<PathBuf> {
    MEDIA_EXTENSIONS
        .iter()
        .map(|ext| dest_prefix.with_extension(ext))
        .find(|candidate| candidate.exists())
}
