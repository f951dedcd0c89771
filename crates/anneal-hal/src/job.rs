//! Job lifecycle types.
//!
//! ```text
//!   submit() ──→ Pending ──→ InProgress ──→ Completed
//!                   │             │
//!                   │             ├──→ Failed(reason)
//!                   │             │
//!                   └─────────────┴──→ Cancelled
//! ```
//!
//! Status strings the remote service reports but this crate does not know
//! map to [`JobStatus::Unknown`] and are treated as still running.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Job is waiting in queue.
    Pending,
    /// Job is currently annealing.
    InProgress,
    /// Job completed successfully.
    Completed,
    /// Job failed with an error message.
    Failed(String),
    /// Job was cancelled.
    Cancelled,
    /// Status string not recognised; polling continues.
    Unknown(String),
}

impl JobStatus {
    /// Map a remote status string (`PENDING`, `IN_PROGRESS`, `COMPLETED`,
    /// `FAILED`, `CANCELLED`) to a status. `error` is the failure reason
    /// reported alongside `FAILED`.
    pub fn from_remote(status: &str, error: Option<&str>) -> Self {
        match status {
            "PENDING" => JobStatus::Pending,
            "IN_PROGRESS" => JobStatus::InProgress,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed(error.unwrap_or_default().to_string()),
            "CANCELLED" => JobStatus::Cancelled,
            other => JobStatus::Unknown(other.to_string()),
        }
    }

    /// The status string as the remote service spells it.
    pub fn as_remote(&self) -> String {
        match self {
            JobStatus::Pending => "PENDING".into(),
            JobStatus::InProgress => "IN_PROGRESS".into(),
            JobStatus::Completed => "COMPLETED".into(),
            JobStatus::Failed(msg) if msg.is_empty() => "FAILED".into(),
            JobStatus::Failed(msg) => format!("FAILED: {msg}"),
            JobStatus::Cancelled => "CANCELLED".into(),
            JobStatus::Unknown(s) => s.clone(),
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }

    /// Check if the job is still pending (queued, running or unknown).
    pub fn is_pending(&self) -> bool {
        !self.is_terminal()
    }

    /// Check if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "Pending"),
            JobStatus::InProgress => write!(f, "InProgress"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed(msg) => write!(f, "Failed: {msg}"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
            JobStatus::Unknown(s) => write!(f, "Unknown: {s}"),
        }
    }
}

/// A submitted job with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// The job identifier.
    pub id: JobId,
    /// Current status.
    pub status: JobStatus,
    /// Solver the job was submitted to.
    pub solver: String,
    /// Number of reads requested.
    pub num_reads: u32,
    /// Time the job was submitted.
    pub submitted_at: DateTime<Utc>,
    /// Time the job reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new pending job.
    pub fn new(id: impl Into<JobId>, solver: impl Into<String>, num_reads: u32) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            solver: solver.into(),
            num_reads,
            submitted_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Update the status.
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        if self.status.is_terminal() && self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
        self
    }
}
