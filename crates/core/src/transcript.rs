// crates/core/src/transcript.rs
//! Transcript payload types and raw-segment formatting.

use serde::{Deserialize, Serialize};

use crate::timestamp::format_timestamp;
use crate::transcriber::RawSegment;

/// One transcribed utterance span, as delivered to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time rendered as `MM:SS` or `HH:MM:SS`.
    pub timestamp: String,
    pub start_seconds: f64,
    pub text: String,
}

/// Final payload of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub title: String,
    pub transcript: Vec<Segment>,
    pub full_text: String,
}

/// Convert engine segments into display segments.
///
/// Text is trimmed and segments that trim to nothing are dropped. Engine
/// output is already ordered by start time; the order is preserved as-is.
pub fn format_segments(raw: &[RawSegment]) -> Vec<Segment> {
    raw.iter()
        .filter_map(|seg| {
            let text = seg.text.trim();
            if text.is_empty() {
                return None;
            }
            let start = seg.start.max(0.0);
            Some(Segment {
                timestamp: format_timestamp(start),
                start_seconds: start,
                text: text.to_string(),
            })
        })
        .collect()
}
