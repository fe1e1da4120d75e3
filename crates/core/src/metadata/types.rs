//! Types for the metadata index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chapter::ChapterRange;

/// One episode, identified within its season by chapter range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeData {
    /// Description filename without its extension; also the stem used for
    /// the placed video file.
    pub title: String,
}

/// All episodes of one season plus their aggregate chapter range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonIndex {
    /// Min start / max end over the episodes. Fixed to `0-0` for Specials.
    pub range: ChapterRange,
    /// Display name from the show description, e.g. "Romance Dawn".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Normalised range string -> episode. Ranges may overlap.
    #[serde(default)]
    pub episodes: BTreeMap<String, EpisodeData>,
}

impl SeasonIndex {
    pub fn new(range: ChapterRange) -> Self {
        Self {
            range,
            name: None,
            episodes: BTreeMap::new(),
        }
    }

    /// Exact lookup by chapter range.
    pub fn episode(&self, range: &ChapterRange) -> Option<&EpisodeData> {
        self.episodes.get(&range.to_string())
    }

    /// Recomputes `range` from the episode keys.
    pub(crate) fn recompute_range(&mut self) {
        let mut keys = self.episodes.keys().filter_map(|k| ChapterRange::parse(k));
        if let Some(first) = keys.next() {
            self.range = keys.fold(first, |acc, r| acc.union(&r));
        }
    }
}

/// Season label -> season.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataIndex {
    #[serde(default)]
    pub seasons: BTreeMap<String, SeasonIndex>,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    pub fn season(&self, label: &str) -> Option<&SeasonIndex> {
        self.seasons.get(label)
    }

    pub fn episode_count(&self) -> usize {
        self.seasons.values().map(|s| s.episodes.len()).sum()
    }

    /// Seasons whose aggregate range contains `range`, lowest start first.
    ///
    /// Season ranges overlap when a compilation episode spans chapters of
    /// several regular seasons, so more than one season may qualify. The
    /// Specials bucket only qualifies for the Specials range itself.
    pub fn candidate_seasons(&self, range: &ChapterRange) -> Vec<(&str, &SeasonIndex)> {
        let mut candidates: Vec<(&str, &SeasonIndex)> = self
            .seasons
            .iter()
            .filter(|(_, season)| {
                if season.range.is_specials() {
                    range.is_specials()
                } else {
                    season.range.contains(range)
                }
            })
            .map(|(label, season)| (label.as_str(), season))
            .collect();

        candidates.sort_by(|(la, a), (lb, b)| {
            a.range
                .start()
                .cmp(&b.range.start())
                .then_with(|| a.range.end().cmp(&b.range.end()))
                .then_with(|| la.cmp(lb))
        });
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(range: &str, episodes: &[(&str, &str)]) -> SeasonIndex {
        let mut season = SeasonIndex::new(ChapterRange::parse(range).unwrap());
        for (r, title) in episodes {
            season.episodes.insert(
                r.to_string(),
                EpisodeData {
                    title: title.to_string(),
                },
            );
        }
        season
    }

    #[test]
    fn test_recompute_range() {
        let mut s = season("0-0", &[("1-1", "a"), ("2-2", "b"), ("5-5", "c"), ("10-10", "d")]);
        s.recompute_range();
        assert_eq!(s.range.to_string(), "1-10");
    }

    #[test]
    fn test_candidate_seasons_sorted_by_start() {
        let mut index = MetadataIndex::new();
        index
            .seasons
            .insert("Season 10".to_string(), season("1-100", &[]));
        index
            .seasons
            .insert("Season 2".to_string(), season("8-21", &[]));
        index
            .seasons
            .insert("Season 3".to_string(), season("22-41", &[]));
        index
            .seasons
            .insert("Specials".to_string(), season("0-0", &[]));

        let range = ChapterRange::new(9, 10).unwrap();
        let labels: Vec<&str> = index
            .candidate_seasons(&range)
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(labels, vec!["Season 10", "Season 2"]);

        let labels: Vec<&str> = index
            .candidate_seasons(&ChapterRange::SPECIALS)
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(labels, vec!["Specials"]);
    }

    #[test]
    fn test_json_shape() {
        let mut index = MetadataIndex::new();
        index.seasons.insert(
            "Season 1".to_string(),
            season("1-7", &[("1-7", "One Pace - S01E01 - Romance Dawn")]),
        );

        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json["seasons"]["Season 1"]["range"], "1-7");
        assert_eq!(
            json["seasons"]["Season 1"]["episodes"]["1-7"]["title"],
            "One Pace - S01E01 - Romance Dawn"
        );

        let back: MetadataIndex = serde_json::from_value(json).unwrap();
        assert_eq!(back, index);
    }
}
