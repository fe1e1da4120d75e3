//! Types for the progress registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chapter::ChapterRange;
use crate::release::ReleaseJob;

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    FetchingMetadata,
    Transferring,
    Placing,
    Done,
    Failed,
    TimedOut,
    Cancelled,
}

impl JobStatus {
    /// Terminal states never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Done | JobStatus::Failed | JobStatus::TimedOut | JobStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::FetchingMetadata => "fetching_metadata",
            JobStatus::Transferring => "transferring",
            JobStatus::Placing => "placing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
            JobStatus::TimedOut => "timed_out",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live state of one release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub transfer_id: u64,
    pub title: String,
    #[serde(default)]
    pub chapter_range: Option<ChapterRange>,
    pub bytes_done: u64,
    pub bytes_total: u64,
    pub status: JobStatus,
    /// Human readable status line, e.g. "Timeout - no seeders?".
    #[serde(default)]
    pub message: String,
    /// Transfer finished (successfully or not).
    pub done: bool,
    /// Files were placed into the library.
    pub placed: bool,
    /// One summary line per placed file.
    #[serde(default)]
    pub placements: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl DownloadRecord {
    /// A fresh `Queued` record for `job`.
    pub fn queued(job: &ReleaseJob) -> Self {
        Self {
            transfer_id: job.transfer_id,
            title: job.label(),
            chapter_range: job.chapter_range,
            bytes_done: 0,
            bytes_total: 0,
            status: JobStatus::Queued,
            message: String::new(),
            done: false,
            placed: false,
            placements: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Fraction of bytes retrieved, 0.0 while the total is unknown.
    pub fn progress(&self) -> f64 {
        if self.bytes_total == 0 {
            0.0
        } else {
            (self.bytes_done as f64 / self.bytes_total as f64).min(1.0)
        }
    }

    /// Moves the record to a terminal state.
    pub fn finish(&mut self, status: JobStatus, message: impl Into<String>) {
        self.status = status;
        self.message = message.into();
        self.done = true;
    }
}
