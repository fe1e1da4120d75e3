//! Transfer client abstraction.
//!
//! A [`TransferClient`] turns descriptor bytes into a running retrieval
//! rooted at a work directory; the [`TransferHandle`] it returns is polled
//! for progress and enumerates the retrieved files once finished.
//! [`DescriptorSource`] supplies the descriptor bytes for a release.
//!
//! Implementations: [`LibrqbitTransferClient`] (embedded librqbit session)
//! and [`HttpDescriptorSource`] (reqwest).

mod config;
mod error;
mod http;
mod librqbit;
mod traits;
mod types;

pub use config::{SourceConfig, TransferConfig};
pub use error::{FetchError, TransferError};
pub use http::HttpDescriptorSource;
pub use librqbit::LibrqbitTransferClient;
pub use traits::{DescriptorSource, TransferClient, TransferHandle};
pub use types::TransferDescriptor;
