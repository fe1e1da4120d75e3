//! Builds a [`MetadataIndex`] by scanning episode description files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::{debug, info, warn};

use super::error::MetadataError;
use super::store::save;
use super::types::{EpisodeData, MetadataIndex, SeasonIndex};
use crate::chapter::{chapter_range_from_description, is_episode_description, xml_tag, ChapterRange};

/// Label of the bucket for season `0`.
pub const SPECIALS_LABEL: &str = "Specials";

/// Show level description file holding `<namedseason>` tags.
pub const SHOW_DESCRIPTION_FILE: &str = "tvshow.nfo";

static NAMED_SEASON: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"<namedseason\s+number="(\d+)">([^<]+)</namedseason>"#).ok());

/// Season label for the `<season>` tag value of an episode.
pub fn season_label(season: &str) -> String {
    let season = season.trim();
    if season.trim_start_matches('0').is_empty() {
        SPECIALS_LABEL.to_string()
    } else {
        format!("Season {season}")
    }
}

/// Scans `root` recursively and builds the index.
///
/// Files that do not yield a season, an episode and a chapter range are
/// skipped. Only a missing root is an error.
pub fn build(root: &Path) -> Result<MetadataIndex, MetadataError> {
    if !root.is_dir() {
        return Err(MetadataError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut index = MetadataIndex::new();
    let mut skipped = 0usize;

    for path in description_files(root) {
        match read_episode(&path) {
            Some((label, range, title)) => {
                index
                    .seasons
                    .entry(label)
                    .or_insert_with(|| SeasonIndex::new(range))
                    .episodes
                    .insert(range.to_string(), EpisodeData { title });
            }
            None => skipped += 1,
        }
    }

    for (label, season) in index.seasons.iter_mut() {
        if label == SPECIALS_LABEL {
            season.range = ChapterRange::SPECIALS;
        } else {
            season.recompute_range();
        }
    }

    name_seasons(&mut index, root);

    info!(
        root = %root.display(),
        seasons = index.seasons.len(),
        episodes = index.episode_count(),
        skipped,
        "Built metadata index"
    );

    Ok(index)
}

/// Builds the index and persists it at the content root.
pub fn build_and_save(root: &Path) -> Result<MetadataIndex, MetadataError> {
    let index = build(root)?;
    save(root, &index)?;
    Ok(index)
}

/// Every episode description file below `root`.
fn description_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(path);
            } else if entry
                .file_name()
                .to_str()
                .is_some_and(is_episode_description)
            {
                found.push(path);
            }
        }
    }

    found.sort();
    found
}

/// Season label, chapter range and title stem of one description file.
fn read_episode(path: &Path) -> Option<(String, ChapterRange, String)> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Unreadable description file");
            return None;
        }
    };
    let content = String::from_utf8_lossy(&bytes);

    let season = xml_tag(&content, "season");
    let episode = xml_tag(&content, "episode");
    let range = chapter_range_from_description(&content);

    let (Some(season), Some(_episode), Some(range)) = (season, episode, range) else {
        debug!(path = %path.display(), "Description file missing season, episode or chapters");
        return None;
    };

    let title = path.file_stem()?.to_string_lossy().into_owned();
    Some((season_label(&season), range, title))
}

/// Applies display names from the show description file, if present.
fn name_seasons(index: &mut MetadataIndex, root: &Path) {
    let path = root.join(SHOW_DESCRIPTION_FILE);
    let content = match fs::read(&path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No show description, seasons stay unnamed");
            return;
        }
    };

    let names = season_names(&content);
    for (label, season) in index.seasons.iter_mut() {
        if let Some(name) = names.get(label) {
            season.name = Some(name.clone());
        }
    }
}

/// `Season <n>` -> display name, from `<namedseason>` tags.
///
/// Both the plain and the zero padded label are produced so that either
/// folder convention picks the name up.
fn season_names(content: &str) -> HashMap<String, String> {
    let mut names = HashMap::new();
    let Some(re) = NAMED_SEASON.as_ref() else {
        return names;
    };

    for caps in re.captures_iter(content) {
        let (Some(number), Some(raw_name)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Ok(number) = number.as_str().parse::<u32>() else {
            continue;
        };

        let raw_name = raw_name.as_str().trim();
        let name = match raw_name.find(". ") {
            Some(idx) => raw_name[idx + 2..].trim(),
            None => raw_name,
        };

        names.insert(format!("Season {number}"), name.to_string());
        names.insert(format!("Season {number:02}"), name.to_string());
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_episode(root: &Path, dir: &str, name: &str, season: &str, episode: &str, chapters: &str) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        let body = format!(
            "<?xml version=\"1.0\"?>\n<episodedetails>\n  <title>{name}</title>\n  <season>{season}</season>\n  <episode>{episode}</episode>\n  <plot>Manga Chapter(s): {chapters}\nAnime Episode(s): 1</plot>\n</episodedetails>\n"
        );
        fs::write(dir.join(format!("{name}.nfo")), body).unwrap();
    }

    #[test]
    fn test_season_label() {
        assert_eq!(season_label("3"), "Season 3");
        assert_eq!(season_label("03"), "Season 03");
        assert_eq!(season_label("0"), SPECIALS_LABEL);
        assert_eq!(season_label("00"), SPECIALS_LABEL);
    }

    #[test]
    fn test_build_aggregates_season_range() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_episode(root, "Season 1", "S01E01", "1", "1", "1");
        write_episode(root, "Season 1", "S01E02", "1", "2", "2");
        write_episode(root, "Season 1", "S01E03", "1", "3", "5");
        write_episode(root, "Season 1", "S01E04", "1", "4", "10");

        let index = build(root).unwrap();
        let season = index.season("Season 1").unwrap();
        assert_eq!(season.range.to_string(), "1-10");
        assert_eq!(season.episodes.len(), 4);
        assert_eq!(season.episodes["5-5"].title, "S01E03");
    }

    #[test]
    fn test_build_specials_and_skips() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_episode(root, "Specials", "S00E01 - Cover Story", "0", "1", "100-102");
        write_episode(root, "Season 2", "S02E01", "2", "1", "8\u{2013}11");
        fs::write(root.join("Season 2").join("broken.nfo"), "<season>2</season>").unwrap();
        fs::write(root.join("Season 2").join("season.nfo"), "<season>2</season>").unwrap();

        let index = build(root).unwrap();
        assert_eq!(index.seasons.len(), 2);
        assert_eq!(index.season(SPECIALS_LABEL).unwrap().range, ChapterRange::SPECIALS);
        let season = index.season("Season 2").unwrap();
        assert_eq!(season.range.to_string(), "8-11");
        assert_eq!(season.episodes["8-11"].title, "S02E01");
    }

    #[test]
    fn test_build_names_seasons() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_episode(root, "Season 1", "S01E01", "1", "1", "1-7");
        write_episode(root, "Season 02", "S02E01", "02", "1", "8-11");
        fs::write(
            root.join(SHOW_DESCRIPTION_FILE),
            r#"<tvshow><namedseason number="1">1. Romance Dawn</namedseason>
<namedseason number="2">2. Orange Town</namedseason></tvshow>"#,
        )
        .unwrap();

        let index = build(root).unwrap();
        assert_eq!(
            index.season("Season 1").unwrap().name.as_deref(),
            Some("Romance Dawn")
        );
        assert_eq!(
            index.season("Season 02").unwrap().name.as_deref(),
            Some("Orange Town")
        );
    }

    #[test]
    fn test_build_missing_root() {
        let result = build(Path::new("/nonexistent/content/root"));
        assert!(matches!(result, Err(MetadataError::RootNotFound { .. })));
    }
}
