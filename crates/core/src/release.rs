//! Release jobs handed to a download session.

use serde::{Deserialize, Serialize};

use crate::chapter::{display_name_from_title, parse_quality, release_title_range, ChapterRange};

/// One selected release, immutable once queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseJob {
    /// Display title.
    pub title: String,
    pub transfer_id: u64,
    /// `None` for specials without a range; placed under `0-0`.
    #[serde(default)]
    pub chapter_range: Option<ChapterRange>,
    #[serde(default = "default_quality")]
    pub quality: String,
    /// Raw release title as listed by the source.
    #[serde(default)]
    pub full_title: String,
    /// User-facing selection key, `0` when unknown.
    #[serde(default)]
    pub download_key: u32,
}

fn default_quality() -> String {
    "n/a".to_string()
}

impl ReleaseJob {
    pub fn new(title: impl Into<String>, transfer_id: u64) -> Self {
        Self {
            title: title.into(),
            transfer_id,
            chapter_range: None,
            quality: default_quality(),
            full_title: String::new(),
            download_key: 0,
        }
    }

    /// Builds a job from a raw release title such as
    /// `[One Pace][8-11] Orange Town [720p][ABCD1234].mkv`.
    pub fn from_release_title(transfer_id: u64, full_title: &str) -> Self {
        Self {
            title: display_name_from_title(full_title),
            transfer_id,
            chapter_range: release_title_range(full_title),
            quality: parse_quality(full_title),
            full_title: full_title.to_string(),
            download_key: 0,
        }
    }

    pub fn with_chapter_range(mut self, range: ChapterRange) -> Self {
        self.chapter_range = Some(range);
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    pub fn with_download_key(mut self, key: u32) -> Self {
        self.download_key = key;
        self
    }

    /// Range used for placement; specials without one fall back to `0-0`.
    pub fn placement_range(&self) -> ChapterRange {
        self.chapter_range.unwrap_or(ChapterRange::SPECIALS)
    }

    /// Title plus quality, for one-line status output.
    pub fn label(&self) -> String {
        format!("{} ({})", self.title, self.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_release_title() {
        let job = ReleaseJob::from_release_title(
            1234,
            "[One Pace][8-11] Orange Town [720p][ABCD1234].mkv",
        );
        assert_eq!(job.transfer_id, 1234);
        assert_eq!(job.title, "Orange Town");
        assert_eq!(job.chapter_range, ChapterRange::new(8, 11));
        assert_eq!(job.quality, "720p");
        assert_eq!(job.label(), "Orange Town (720p)");
    }

    #[test]
    fn test_specials_fall_back_to_zero_range() {
        let job = ReleaseJob::from_release_title(7, "[One Pace] Cover Story Special [1080p]");
        assert!(job.chapter_range.is_none());
        assert_eq!(job.placement_range(), ChapterRange::SPECIALS);

        let forced = job.with_chapter_range(ChapterRange::new(100, 102).unwrap());
        assert_eq!(forced.placement_range().to_string(), "100-102");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let job: ReleaseJob = toml::from_str(
            r#"
title = "Drum Island"
transfer_id = 42
chapter_range = "150-154"
"#,
        )
        .unwrap();
        assert_eq!(job.quality, "n/a");
        assert_eq!(job.download_key, 0);
        assert_eq!(job.chapter_range, ChapterRange::new(150, 154));
    }
}
