//! Types for the worker module.

use std::time::Duration;

use serde::Serialize;

use crate::registry::JobStatus;

/// How a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcomeKind {
    Completed,
    TimedOut,
    Cancelled,
    FetchFailed,
    TransferFailed,
    PlacementFailed,
}

impl JobOutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::TimedOut => "timeout",
            Self::Cancelled => "cancelled",
            Self::FetchFailed => "fetch",
            Self::TransferFailed => "transfer",
            Self::PlacementFailed => "placement",
        }
    }

    /// Terminal registry status for this outcome.
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Completed => JobStatus::Done,
            Self::TimedOut => JobStatus::TimedOut,
            Self::Cancelled => JobStatus::Cancelled,
            Self::FetchFailed | Self::TransferFailed | Self::PlacementFailed => JobStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// What a worker hands back to the session.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub transfer_id: u64,
    pub kind: JobOutcomeKind,
    /// Same text as the record's final message.
    pub message: String,
    /// One summary line per placed file.
    pub placements: Vec<String>,
}

/// Timing knobs shared by every worker of a session.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// How often progress is sampled while transferring.
    pub poll_interval: Duration,
    /// How long to wait for the transfer to report its size.
    pub metadata_timeout: Duration,
    /// Deadline for fetching and transferring one job.
    pub job_timeout: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            metadata_timeout: Duration::from_secs(20),
            job_timeout: Duration::from_secs(30 * 60),
        }
    }
}
