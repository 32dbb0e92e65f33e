// crates/core/src/lib.rs
//! Podscribe core library.
//!
//! Domain layer for the transcription pipeline: collaborator traits for the
//! media fetcher and the transcription engine (plus their CLI-backed
//! production implementations), transcript formatting, timestamp formatting,
//! the in-flight progress estimator, and URL validation for the submission
//! boundary.

pub mod error;
pub mod fetcher;
pub mod progress;
pub mod timestamp;
pub mod transcriber;
pub mod transcript;
pub mod validate;

pub use error::{FetchError, TranscribeError};
pub use fetcher::{locate_media_file, FetchedMedia, MediaFetcher, YtDlpFetcher, MEDIA_EXTENSIONS};
pub use progress::{buffered_expected_secs, estimate_transcribe_progress, ESTIMATE_INTERVAL};
pub use timestamp::format_timestamp;
pub use transcriber::{RawSegment, RawTranscript, Transcriber, WhisperCliTranscriber};
pub use transcript::{format_segments, Segment, TranscriptResult};
pub use validate::is_safe_url;
