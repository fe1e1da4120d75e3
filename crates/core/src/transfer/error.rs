//! Error types for the transfer module.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a transfer client or one of its handles.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Failed to start transfer session: {0}")]
    SessionFailed(String),

    #[error("Failed to add transfer: {0}")]
    AddFailed(String),

    #[error("Timed out after {0:?} waiting for transfer metadata")]
    MetadataTimeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while fetching descriptor bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// Whether a later attempt might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Request { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Client(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        let url = "http://x".to_string();
        assert!(FetchError::Timeout { url: url.clone() }.is_transient());
        assert!(FetchError::Status {
            url: url.clone(),
            status: 503
        }
        .is_transient());
        assert!(!FetchError::Status { url, status: 404 }.is_transient());
        assert!(!FetchError::Client("tls".to_string()).is_transient());
    }
}
