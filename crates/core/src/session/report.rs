//! End-of-session report.

use std::time::Duration;

use serde::Serialize;

use crate::registry::JobStatus;
use crate::worker::JobOutcomeKind;

/// Final word on one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub transfer_id: u64,
    pub title: String,
    pub kind: JobOutcomeKind,
    /// Last registry status seen before the registry was cleared.
    pub status: JobStatus,
    pub message: String,
    pub placements: Vec<String>,
}

impl JobReport {
    /// One-line status, e.g. `Orange Town (720p): 1 file placed`.
    pub fn line(&self) -> String {
        format!("{}: {}", self.title, self.message)
    }
}

/// Everything a session did, in submission order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionReport {
    pub jobs: Vec<JobReport>,
    /// The session token was cancelled before every job finished.
    pub cancelled: bool,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl SessionReport {
    pub fn completed_count(&self) -> usize {
        self.jobs.iter().filter(|j| j.kind.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.jobs.len() - self.completed_count()
    }

    pub fn all_completed(&self) -> bool {
        self.failed_count() == 0
    }

    /// One status line per job followed by its placement lines.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for job in &self.jobs {
            lines.push(job.line());
            lines.extend(job.placements.iter().map(|p| format!("  {p}")));
        }
        lines
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}
