//! Error types for the metadata module.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    /// The content root does not exist or is not a directory.
    #[error("Content root not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize metadata index: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl MetadataError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
