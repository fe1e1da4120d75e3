//! Lookup strategies, tried in order against each candidate season.

use crate::chapter::{
    bracketed_range, release_title_range, rough_chapter_from_title, season_number_from_label,
    RoughChapter,
};
use crate::metadata::SeasonIndex;

use super::types::MatchInput;

/// Returns the episode title stem when the strategy finds one.
pub type Strategy = fn(&MatchInput<'_>, &str, &SeasonIndex) -> Option<String>;

/// Fallback chain, most precise first.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("exact_range", try_exact_range),
    ("filename_range", try_filename_range),
    ("rough_chapter", try_rough_chapter),
];

/// The recorded range is itself an episode of the season.
pub fn try_exact_range(input: &MatchInput<'_>, _label: &str, season: &SeasonIndex) -> Option<String> {
    season
        .episode(input.original_range)
        .map(|episode| episode.title.clone())
}

/// The filename carries a narrower range than the one recorded for the
/// release, e.g. one episode out of a whole-season batch.
pub fn try_filename_range(
    input: &MatchInput<'_>,
    _label: &str,
    season: &SeasonIndex,
) -> Option<String> {
    let range = release_title_range(input.filename).or_else(|| bracketed_range(input.filename))?;
    season.episode(&range).map(|episode| episode.title.clone())
}

/// `Chapter a-b` looks up the table; a lone `Chapter n` / `Episode n`
/// becomes an `S<season>E<n>` key searched for in the episode titles.
pub fn try_rough_chapter(input: &MatchInput<'_>, label: &str, season: &SeasonIndex) -> Option<String> {
    match rough_chapter_from_title(input.filename) {
        RoughChapter::Range(range) => season.episode(&range).map(|episode| episode.title.clone()),
        RoughChapter::Single(number) => {
            let season_number: u32 = season_number_from_label(label).parse().unwrap_or(0);
            let key = format!("S{season_number:02}E{number:02}");
            season
                .episodes
                .values()
                .find(|episode| episode.title.contains(&key))
                .map(|episode| episode.title.clone())
        }
        RoughChapter::Nothing => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapter::ChapterRange;
    use crate::metadata::EpisodeData;

    fn season() -> SeasonIndex {
        let mut season = SeasonIndex::new(ChapterRange::new(8, 21).unwrap());
        for (key, title) in [
            ("8-11", "One Pace - S02E01 - Orange Town"),
            ("12-14", "One Pace - S02E02 - The Circus"),
        ] {
            season.episodes.insert(
                key.to_string(),
                EpisodeData {
                    title: title.to_string(),
                },
            );
        }
        season
    }

    #[test]
    fn test_each_strategy_in_isolation() {
        let recorded = ChapterRange::new(8, 11).unwrap();
        let unrelated = ChapterRange::new(8, 21).unwrap();
        let season = season();

        let input = MatchInput {
            filename: "anything.mkv",
            original_range: &recorded,
        };
        assert!(try_exact_range(&input, "Season 2", &season).is_some());
        assert!(try_filename_range(&input, "Season 2", &season).is_none());
        assert!(try_rough_chapter(&input, "Season 2", &season).is_none());

        let input = MatchInput {
            filename: "[One Pace][12-14] The Circus.mkv",
            original_range: &unrelated,
        };
        assert!(try_exact_range(&input, "Season 2", &season).is_none());
        assert_eq!(
            try_filename_range(&input, "Season 2", &season).as_deref(),
            Some("One Pace - S02E02 - The Circus")
        );

        let input = MatchInput {
            filename: "Orange Town Episode 1.mkv",
            original_range: &unrelated,
        };
        assert_eq!(
            try_rough_chapter(&input, "Season 2", &season).as_deref(),
            Some("One Pace - S02E01 - Orange Town")
        );
        assert!(try_rough_chapter(&input, "Season 5", &season).is_none());
    }

    #[test]
    fn test_strategy_order() {
        let names: Vec<&str> = STRATEGIES.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["exact_range", "filename_range", "rough_chapter"]);
    }
}
