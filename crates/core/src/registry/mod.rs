//! Progress registry.
//!
//! One [`DownloadRecord`] per in-flight release, keyed by transfer id.
//! Workers mutate only their own record; the reporter, the status server
//! and the session read consistent snapshots. The map sits behind a single
//! `std::sync::Mutex` and no lock is ever held across an `.await`.
//!
//! With a snapshot file configured, every mutation rewrites it so another
//! process (`chapterbay progress`) can follow along.

mod error;
mod store;
mod types;

pub use error::RegistryError;
pub use store::{read_snapshot, ProgressRegistry};
pub use types::{DownloadRecord, JobStatus};
