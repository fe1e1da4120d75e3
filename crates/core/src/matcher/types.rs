//! Types for the matcher module.

use std::path::PathBuf;

use crate::chapter::ChapterRange;

/// What a strategy gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct MatchInput<'a> {
    /// Bare file name, no directories.
    pub filename: &'a str,
    /// Range recorded for the release this file came from.
    pub original_range: &'a ChapterRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    /// Found an episode title in `season` using the named strategy.
    Matched {
        season: String,
        strategy: &'static str,
    },
    /// Nothing matched; destination is under the quarantine directory.
    Stray,
}

/// Outcome of [`resolve`](super::resolve).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Full destination path without the file extension.
    pub destination_stem: PathBuf,
    pub kind: MatchKind,
}

impl Resolution {
    pub fn is_stray(&self) -> bool {
        matches!(self.kind, MatchKind::Stray)
    }
}
