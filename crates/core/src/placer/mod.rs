//! Placer module for moving downloaded videos into the library.
//!
//! This module provides the `Placer` trait and a file system implementation
//! that resolves each video's destination through the matcher and moves it
//! there safely.
//!
//! # Features
//!
//! - Atomic rename when possible, copy + rename fallback otherwise
//! - Unique staging file per call, so concurrent placements never corrupt
//!   a destination (last writer wins)
//! - Optional SHA-256 verification of copies
//! - Automatic parent directory creation
//! - Timestamped quarantine when the resolved destination cannot be written
//!
//! # Example
//!
//! ```ignore
//! use chapterbay_core::placer::{FsPlacer, Placer, PlacerConfig};
//!
//! let placer = FsPlacer::new("/media/one-pace", PlacerConfig::default());
//! let range = ChapterRange::parse("8-11").unwrap();
//!
//! if let Some(outcome) = placer.place(&downloaded_file, &index, &range).await? {
//!     println!("{}", outcome.summary);
//! }
//! ```

mod config;
mod error;
mod fs_placer;
mod traits;
mod types;

pub use config::PlacerConfig;
pub use error::PlacerError;
pub use fs_placer::{collect_videos, FsPlacer};
pub use traits::Placer;
pub use types::{BatchPlacement, PlacementKind, PlacementOutcome};
