//! Error types for the worker module.

use thiserror::Error;

use super::types::JobOutcomeKind;
use crate::transfer::{FetchError, TransferError};

/// Why a job stopped before completing.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job deadline expired")]
    Timeout,

    #[error("job cancelled")]
    Cancelled,

    #[error("descriptor fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("placement failed: {0}")]
    Placement(String),
}

impl WorkerError {
    pub fn kind(&self) -> JobOutcomeKind {
        match self {
            Self::Timeout => JobOutcomeKind::TimedOut,
            Self::Cancelled => JobOutcomeKind::Cancelled,
            Self::Fetch(_) => JobOutcomeKind::FetchFailed,
            Self::Transfer(TransferError::MetadataTimeout(_)) => JobOutcomeKind::TimedOut,
            Self::Transfer(_) => JobOutcomeKind::TransferFailed,
            Self::Placement(_) => JobOutcomeKind::PlacementFailed,
        }
    }

    /// Status line written to the job's record.
    pub fn message(&self) -> String {
        match self.kind() {
            JobOutcomeKind::TimedOut => "Timeout - no seeders?".to_string(),
            JobOutcomeKind::Cancelled => "Cancelled".to_string(),
            _ => format!("Failed: {self}"),
        }
    }
}
