//! Chapter ranges and the text extraction helpers built on them.
//!
//! Releases, episode description files and downloaded filenames all identify
//! content by the manga chapters they cover. This module owns the
//! [`ChapterRange`] type plus every parser that pulls a range (or a season /
//! episode key) out of free-form text.

mod extract;
mod range;

pub use extract::{
    bracketed_range, chapter_range_from_description, display_name_from_title,
    episode_number_from_key, is_episode_description, parse_quality, release_title_range,
    rough_chapter_from_title, season_number_from_key, season_number_from_label,
    transfer_id_from_link, xml_tag, RoughChapter,
};
pub use range::{
    normalize_dash, parse_range, range_contains, ranges_overlap, ChapterRange, InvalidRange,
    INVALID_RANGE,
};
