//! Trait definitions for the transfer module.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use super::error::{FetchError, TransferError};
use super::types::TransferDescriptor;
use crate::release::ReleaseJob;

/// Starts retrievals from descriptor bytes.
#[async_trait]
pub trait TransferClient: Send + Sync {
    /// Returns the name of this client implementation.
    fn name(&self) -> &str;

    /// Parses and validates descriptor bytes.
    fn load_descriptor(&self, bytes: Vec<u8>) -> Result<TransferDescriptor, TransferError> {
        TransferDescriptor::from_bytes(bytes)
    }

    /// Starts retrieving into `work_dir`.
    async fn begin_retrieval(
        &self,
        descriptor: TransferDescriptor,
        work_dir: &Path,
    ) -> Result<Box<dyn TransferHandle>, TransferError>;
}

/// A running retrieval.
#[async_trait]
pub trait TransferHandle: Send + Sync {
    fn bytes_completed(&self) -> u64;

    fn bytes_total(&self) -> u64;

    fn is_finished(&self) -> bool;

    /// Retrieved files, relative to the work directory.
    fn files(&self) -> Vec<PathBuf>;

    /// Waits until the total size is known.
    async fn await_metadata(&self, timeout: Duration) -> Result<(), TransferError>;

    /// Stops the retrieval. Retrieved files stay on disk.
    async fn shutdown(&self);
}

/// Supplies descriptor bytes for a release.
#[async_trait]
pub trait DescriptorSource: Send + Sync {
    async fn fetch(&self, job: &ReleaseJob) -> Result<Vec<u8>, FetchError>;
}
