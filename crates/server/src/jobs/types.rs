// crates/server/src/jobs/types.rs
//! Types for the transcription job system.

use chrono::{DateTime, Utc};
use podscribe_core::TranscriptResult;
use serde::{Deserialize, Serialize};

/// Opaque job identifier (8 random hex characters).
pub type JobId = String;

/// Lifecycle of one transcription job.
///
/// Transitions run forward only: pending → downloading → processing →
/// transcribing → formatting → completed, with failed reachable from any
/// non-terminal stage. Nothing leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Downloading,
    Processing,
    Transcribing,
    Formatting,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Position along the pipeline, used to reject backward transitions.
    fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Downloading => 1,
            JobStatus::Processing => 2,
            JobStatus::Transcribing => 3,
            JobStatus::Formatting => 4,
            JobStatus::Completed | JobStatus::Failed => 5,
        }
    }

    /// Whether `next` is a legal transition from this status.
    pub fn allows(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == JobStatus::Failed || next.rank() >= self.rank()
    }
}

/// Full mutable record for one job. Owned exclusively by the store.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub url: String,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub result: Option<TranscriptResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(id: JobId, url: String) -> Self {
        Self {
            id,
            url,
            status: JobStatus::Pending,
            progress: 0,
            message: "Job queued".to_string(),
            result: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Point-in-time view delivered to progress observers.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            status: self.status,
            progress: self.progress,
            message: self.message.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// The streamed view of a job. `result` and `error` only appear on the
/// terminal snapshot, and never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TranscriptResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Partial update applied atomically by the store.
#[derive(Debug, Default, Clone)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub message: Option<String>,
    pub result: Option<TranscriptResult>,
    pub error: Option<String>,
}

impl JobUpdate {
    /// Stage transition: status, progress, and message together.
    pub fn stage(status: JobStatus, progress: u8, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            progress: Some(progress),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// In-stage progress tick without a status change.
    pub fn tick(progress: u8, message: impl Into<String>) -> Self {
        Self {
            progress: Some(progress),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Terminal success: result and completed status land together.
    pub fn completed(result: TranscriptResult) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            progress: Some(100),
            message: Some("Transcription complete".to_string()),
            result: Some(result),
            ..Self::default()
        }
    }

    /// Terminal failure: user-facing message plus the underlying cause.
    pub fn failed(message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            message: Some(message.into()),
            error: Some(cause.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Transcribing).unwrap(),
            "\"transcribing\""
        );
        assert_eq!(
            serde_json::from_str::<JobStatus>("\"completed\"").unwrap(),
            JobStatus::Completed
        );
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Transcribing.is_terminal());
    }

    #[test]
    fn forward_transitions_allowed() {
        assert!(JobStatus::Pending.allows(JobStatus::Downloading));
        assert!(JobStatus::Downloading.allows(JobStatus::Processing));
        assert!(JobStatus::Formatting.allows(JobStatus::Completed));
        // Failure is reachable from any non-terminal stage.
        assert!(JobStatus::Pending.allows(JobStatus::Failed));
        assert!(JobStatus::Formatting.allows(JobStatus::Failed));
    }

    #[test]
    fn backward_and_post_terminal_transitions_rejected() {
        assert!(!JobStatus::Transcribing.allows(JobStatus::Downloading));
        assert!(!JobStatus::Completed.allows(JobStatus::Failed));
        assert!(!JobStatus::Failed.allows(JobStatus::Pending));
    }

    #[test]
    fn new_job_is_pending_at_zero() {
        let job = Job::new("ab12cd34".to_string(), "https://example.com/ep.mp3".to_string());
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert!(job.result.is_none());
        assert!(job.error.is_none());
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn snapshot_omits_absent_result_and_error() {
        let job = Job::new("ab12cd34".to_string(), "https://example.com/ep.mp3".to_string());
        let json = serde_json::to_string(&job.snapshot()).unwrap();
        assert!(json.contains("\"status\":\"pending\""));
        assert!(!json.contains("result"));
        assert!(!json.contains("error"));
    }
}
