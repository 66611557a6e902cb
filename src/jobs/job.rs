//! Job records and their status state machine.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Identifier assigned by the registry, starting at 1.
pub type JobId = u64;

/// Lifecycle of a download job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Downloading,
    Completed,
    Failed(String),
}

impl JobStatus {
    /// Whether the job has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed(_))
    }

    /// Whether moving from `self` to `next` is a forward transition.
    pub fn can_transition_to(&self, next: &JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Downloading)
                | (JobStatus::Pending, JobStatus::Failed(_))
                | (JobStatus::Downloading, JobStatus::Completed)
                | (JobStatus::Downloading, JobStatus::Failed(_))
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "Pending"),
            JobStatus::Downloading => write!(f, "Downloading"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Everything needed to register a new job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub source_url: String,
    pub filename: String,
    pub segments: Vec<String>,
    pub content_digest: String,
}

/// One requested download, owned by the registry.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub source_url: String,
    pub filename: String,
    pub status: JobStatus,
    pub segments_total: usize,
    pub segments_done: usize,
    pub bytes_done: u64,
    pub speed_bytes_per_sec: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub started: Option<Instant>,
    pub ordered_segments: Arc<[String]>,
    pub content_digest: String,
}

impl Job {
    pub(crate) fn new(id: JobId, new: NewJob) -> Self {
        Self {
            id,
            source_url: new.source_url,
            filename: new.filename,
            status: JobStatus::Pending,
            segments_total: new.segments.len(),
            segments_done: 0,
            bytes_done: 0,
            speed_bytes_per_sec: 0.0,
            started_at: None,
            started: None,
            ordered_segments: new.segments.into(),
            content_digest: new.content_digest,
        }
    }

    /// Percentage of segments finished (success or failure).
    pub fn progress(&self) -> f64 {
        if self.status == JobStatus::Completed {
            return 100.0;
        }
        if self.segments_total == 0 {
            return 0.0;
        }
        self.segments_done as f64 / self.segments_total as f64 * 100.0
    }

    /// Serializable copy without internal fields.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            url: self.source_url.clone(),
            filename: self.filename.clone(),
            status: self.status.clone(),
            progress: self.progress(),
            segments_done: self.segments_done,
            total_segments: self.segments_total,
            bytes_done: self.bytes_done,
            speed: self.speed_bytes_per_sec,
            content_digest: self.content_digest.clone(),
            started_at: self.started_at,
        }
    }
}

/// Point-in-time view of a job, as exposed to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    #[serde(skip)]
    pub id: JobId,
    pub url: String,
    pub filename: String,
    pub status: JobStatus,
    pub progress: f64,
    pub segments_done: usize,
    pub total_segments: usize,
    pub bytes_done: u64,
    pub speed: f64,
    pub content_digest: String,
    pub started_at: Option<DateTime<Utc>>,
}
