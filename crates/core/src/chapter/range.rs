//! Inclusive chapter intervals.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Returned by [`parse_range`] for anything that is not `"<int>-<int>"`.
pub const INVALID_RANGE: (i64, i64) = (-1, -1);

/// A string that could not be read as a chapter range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid chapter range: {0:?}")]
pub struct InvalidRange(pub String);

/// Replaces en-dash and em-dash characters with a plain hyphen.
pub fn normalize_dash(s: &str) -> String {
    s.replace(['\u{2013}', '\u{2014}'], "-")
}

/// Splits `"a-b"` into its two integers.
///
/// Exactly two hyphen separated integer parts are required; anything else
/// yields [`INVALID_RANGE`]. Callers normalise dashes first.
pub fn parse_range(s: &str) -> (i64, i64) {
    let mut parts = s.split('-');
    let (Some(first), Some(second), None) = (parts.next(), parts.next(), parts.next()) else {
        return INVALID_RANGE;
    };

    match (first.trim().parse::<i64>(), second.trim().parse::<i64>()) {
        (Ok(start), Ok(end)) => (start, end),
        _ => INVALID_RANGE,
    }
}

/// `[start1, end1]` and `[start2, end2]` share at least one chapter.
pub fn ranges_overlap(start1: i64, end1: i64, start2: i64, end2: i64) -> bool {
    start1 <= end2 && start2 <= end1
}

/// `[start2, end2]` lies entirely inside `[start1, end1]`.
pub fn range_contains(start1: i64, end1: i64, start2: i64, end2: i64) -> bool {
    start1 <= start2 && end2 <= end1
}

/// An inclusive interval of manga chapters, written `"start-end"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChapterRange {
    start: u32,
    end: u32,
}

impl ChapterRange {
    /// The zero sized range used as the aggregate of the Specials season.
    pub const SPECIALS: ChapterRange = ChapterRange { start: 0, end: 0 };

    /// Creates a range, rejecting `start > end`.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// A release covering a single chapter.
    pub fn single(chapter: u32) -> Self {
        Self {
            start: chapter,
            end: chapter,
        }
    }

    /// Parses `"a-b"` (any dash variant) or a bare chapter number.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = normalize_dash(s.trim());
        if normalized.is_empty() {
            return None;
        }

        if !normalized.contains('-') {
            return normalized.parse::<u32>().ok().map(Self::single);
        }

        let (start, end) = parse_range(&normalized);
        if start < 0 || end < 0 {
            return None;
        }
        Self::new(u32::try_from(start).ok()?, u32::try_from(end).ok()?)
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn is_specials(&self) -> bool {
        *self == Self::SPECIALS
    }

    pub fn overlaps(&self, other: &ChapterRange) -> bool {
        ranges_overlap(
            self.start.into(),
            self.end.into(),
            other.start.into(),
            other.end.into(),
        )
    }

    /// `other` lies entirely inside `self`.
    pub fn contains(&self, other: &ChapterRange) -> bool {
        range_contains(
            self.start.into(),
            self.end.into(),
            other.start.into(),
            other.end.into(),
        )
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &ChapterRange) -> ChapterRange {
        ChapterRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for ChapterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for ChapterRange {
    type Err = InvalidRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidRange(s.to_string()))
    }
}

impl Serialize for ChapterRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChapterRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
