//! Queries answering "what do we already have on disk?".

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::types::MetadataIndex;
use super::{is_video_file, VIDEO_EXTENSIONS};
use crate::chapter::{is_episode_description, season_number_from_label, ChapterRange};

/// How much of a chapter range is present in the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    None,
    Partial,
    Complete,
}

impl VideoStatus {
    /// Numeric form: 0 none, 1 partial, 2 complete.
    pub fn code(&self) -> u8 {
        match self {
            VideoStatus::None => 0,
            VideoStatus::Partial => 1,
            VideoStatus::Complete => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::None => "none",
            VideoStatus::Partial => "partial",
            VideoStatus::Complete => "complete",
        }
    }
}

/// Whether `range` equals a season's aggregate range or any episode range.
pub fn have_metadata(index: &MetadataIndex, range: &str) -> bool {
    let Some(range) = ChapterRange::parse(range) else {
        return false;
    };

    index.seasons.values().any(|season| {
        season.range == range
            || season
                .episodes
                .keys()
                .any(|key| ChapterRange::parse(key) == Some(range))
    })
}

/// Checks every episode contained in `range` for a video file on disk.
pub fn video_status(index: &MetadataIndex, root: &Path, range: &ChapterRange) -> VideoStatus {
    let mut relevant = 0usize;
    let mut found = 0usize;

    for (label, season) in &index.seasons {
        let season_dir = root.join(label);
        for (key, episode) in &season.episodes {
            let Some(episode_range) = ChapterRange::parse(key) else {
                continue;
            };
            if !range.contains(&episode_range) {
                continue;
            }

            relevant += 1;
            let present = VIDEO_EXTENSIONS
                .iter()
                .any(|ext| season_dir.join(format!("{}.{ext}", episode.title)).is_file());
            if present {
                found += 1;
            }
        }
    }

    match (relevant, found) {
        (0, _) | (_, 0) => VideoStatus::None,
        (r, f) if f < r => VideoStatus::Partial,
        _ => VideoStatus::Complete,
    }
}

/// Counts episode description files below `dir` and how many of them have a
/// video file with the same stem next to them.
///
/// Returns `(matched, descriptions)`. A missing directory counts as empty.
pub fn count_videos_and_total(dir: &Path) -> (usize, usize) {
    let mut videos: HashSet<PathBuf> = HashSet::new();
    let mut descriptions: Vec<PathBuf> = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_lowercase();
            if is_video_file(&path) {
                videos.insert(path.with_extension(""));
            } else if is_episode_description(&name) {
                descriptions.push(path.with_extension(""));
            }
        }
    }

    let matched = descriptions.iter().filter(|d| videos.contains(*d)).count();
    (matched, descriptions.len())
}

/// Per season counts for the `info` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonSummary {
    pub label: String,
    pub number: u32,
    pub name: Option<String>,
    pub range: ChapterRange,
    pub videos: usize,
    pub descriptions: usize,
}

/// One summary per indexed season, ordered by season number.
pub fn season_summaries(index: &MetadataIndex, root: &Path) -> Vec<SeasonSummary> {
    let mut summaries: Vec<SeasonSummary> = index
        .seasons
        .iter()
        .map(|(label, season)| {
            let (videos, descriptions) = count_videos_and_total(&root.join(label));
            SeasonSummary {
                label: label.clone(),
                number: season_number_from_label(label).parse().unwrap_or(0),
                name: season.name.clone(),
                range: season.range,
                videos,
                descriptions,
            }
        })
        .collect();

    summaries.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.label.cmp(&b.label)));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{EpisodeData, SeasonIndex};
    use tempfile::TempDir;

    fn two_episode_index() -> MetadataIndex {
        let mut season = SeasonIndex::new(ChapterRange::new(1, 2).unwrap());
        for (key, title) in [("1-1", "Episode_1"), ("2-2", "Episode_2")] {
            season.episodes.insert(
                key.to_string(),
                EpisodeData {
                    title: title.to_string(),
                },
            );
        }
        let mut index = MetadataIndex::new();
        index.seasons.insert("Season 1".to_string(), season);
        index
    }

    fn range(s: &str) -> ChapterRange {
        ChapterRange::parse(s).unwrap()
    }

    #[test]
    fn test_video_status_partial_none_complete() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let index = two_episode_index();
        let season_dir = root.join("Season 1");
        fs::create_dir_all(&season_dir).unwrap();

        assert_eq!(video_status(&index, root, &range("1-2")), VideoStatus::None);

        fs::write(season_dir.join("Episode_1.mp4"), b"video").unwrap();
        assert_eq!(video_status(&index, root, &range("1-1")), VideoStatus::Complete);
        assert_eq!(video_status(&index, root, &range("2-2")), VideoStatus::None);
        assert_eq!(video_status(&index, root, &range("1-2")), VideoStatus::Partial);
        assert_eq!(video_status(&index, root, &range("1-2")).code(), 1);
        assert_eq!(video_status(&index, root, &range("3-4")), VideoStatus::None);

        fs::write(season_dir.join("Episode_2.mkv"), b"video").unwrap();
        assert_eq!(video_status(&index, root, &range("1-2")), VideoStatus::Complete);
        assert_eq!(video_status(&index, root, &range("1-2")).code(), 2);
    }

    #[test]
    fn test_have_metadata() {
        let index = two_episode_index();
        assert!(have_metadata(&index, "1-2"));
        assert!(have_metadata(&index, "2-2"));
        assert!(have_metadata(&index, "1\u{2013}1"));
        assert!(!have_metadata(&index, "3-4"));
        assert!(!have_metadata(&index, ""));
    }

    #[test]
    fn test_count_videos_and_total() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Season 1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("S01E01.nfo"), "").unwrap();
        fs::write(dir.join("S01E01.mkv"), "").unwrap();
        fs::write(dir.join("S01E02.nfo"), "").unwrap();
        fs::write(dir.join("season.nfo"), "").unwrap();
        fs::write(dir.join("orphan.mp4"), "").unwrap();

        assert_eq!(count_videos_and_total(&dir), (1, 2));
        assert_eq!(count_videos_and_total(&temp.path().join("missing")), (0, 0));
    }

    #[test]
    fn test_season_summaries_sorted() {
        let temp = TempDir::new().unwrap();
        let mut index = two_episode_index();
        index.seasons.insert(
            "Season 10".to_string(),
            SeasonIndex::new(ChapterRange::new(100, 120).unwrap()),
        );
        index.seasons.insert(
            "Specials".to_string(),
            SeasonIndex::new(ChapterRange::SPECIALS),
        );

        let labels: Vec<String> = season_summaries(&index, temp.path())
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["Specials", "Season 1", "Season 10"]);
    }
}
