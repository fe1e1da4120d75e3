//! Download session supervisor.
//!
//! A [`DownloadSession`] fans a batch of [`ReleaseJob`](crate::release::ReleaseJob)s
//! out over a fixed pool of workers, gives every job its own deadline and a
//! child of the session's cancellation token, and always ends with a
//! [`SessionReport`], an empty registry and no work directories left behind.
//!
//! [`ProgressReporter`] is the optional background task that hands registry
//! snapshots to a [`ProgressSink`] while a session runs.

mod cleanup;
mod config;
mod report;
mod reporter;
mod supervisor;

pub use cleanup::{recover_stale_state, remove_work_dir, StaleCleanup, WORK_DIR_PREFIX};
pub use config::SessionConfig;
pub use report::{JobReport, SessionReport};
pub use reporter::{ProgressReporter, ProgressSink, TracingSink};
pub use supervisor::DownloadSession;
