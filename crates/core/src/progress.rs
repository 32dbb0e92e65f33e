// crates/core/src/progress.rs
//! Progress estimation for the transcription stage.
//!
//! The engine exposes no progress callback, so while a call is outstanding
//! the worker extrapolates a percentage from wall-clock time against the
//! expected media duration. The estimate is advisory and clamped to
//! [30, 90]; completion is always driven by the engine actually returning,
//! never by the estimate topping out.

use std::time::Duration;

/// Fallback expected duration (seconds) when the source reports none.
pub const DEFAULT_EXPECTED_SECS: f64 = 300.0;

/// Safety buffer applied to the expected duration so the estimate does not
/// appear to finish before the engine returns.
pub const EXPECTED_BUFFER: f64 = 1.2;

/// How often the worker re-evaluates the estimate while a call is in flight.
pub const ESTIMATE_INTERVAL: Duration = Duration::from_secs(2);

/// Expected transcription duration for a piece of media, buffered.
///
/// Unknown or non-positive durations fall back to [`DEFAULT_EXPECTED_SECS`].
pub fn buffered_expected_secs(duration_seconds: Option<f64>) -> f64 {
    duration_seconds
        .filter(|d| *d > 0.0)
        .unwrap_or(DEFAULT_EXPECTED_SECS)
        * EXPECTED_BUFFER
}

/// Map elapsed wall-clock time to a percentage in [30, 90].
///
/// `30 + min(60, elapsed / expected * 60)`; a non-positive expected duration
/// yields the fixed midpoint 50.
pub fn estimate_transcribe_progress(elapsed_secs: f64, expected_secs: f64) -> u8 {
    if expected_secs <= 0.0 {
        return 50;
    }
    let gained = ((elapsed_secs / expected_secs) * 60.0).clamp(0.0, 60.0);
    30 + gained as u8
}
