//! Download worker.
//!
//! Drives one [`ReleaseJob`](crate::release::ReleaseJob) through
//! `Queued → FetchingMetadata → Transferring → Placing → Done`, mirroring
//! every step into the [`ProgressRegistry`](crate::registry::ProgressRegistry).
//!
//! The fetch and transfer phases give up on the job's deadline or on
//! cancellation of the job's token. Placement is never interrupted: once
//! files start moving the job runs to the end. Errors never escape a
//! worker; they become the record's terminal status and the returned
//! [`JobOutcome`].

mod error;
mod job;
mod types;

pub use error::WorkerError;
pub use job::{run_job, WorkerContext};
pub use types::{JobOutcome, JobOutcomeKind, WorkerSettings};
