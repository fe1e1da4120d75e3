//! Pulls chapter ranges, keys and labels out of release titles, filenames
//! and episode description files.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::debug;

use super::range::{normalize_dash, ChapterRange};

static RELEASE_TITLE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)\[One Pace\]\s*\[([^\]]+)\]").ok());
static ALL_DIGITS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d+$").ok());
static DIGIT_RANGE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d+\s*-\s*\d+$").ok());
static BRACKETED_RANGE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\[\s*(\d+)\s*-\s*(\d+)\s*\]").ok());
static DESCRIPTION_CHAPTERS: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)Manga\s*Chapters?(?:\(s\))?\s*:\s*(\d+)(?:[\s,-]*(\d+))?").ok()
});
static ROUGH_RANGE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(Chapters?|Episodes?)\s*(\d+)\s*-\s*(\d+)").ok());
static ROUGH_SINGLE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(Chapters?|Episodes?)\s*(\d+)\b").ok());
static EPISODE_KEY: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"E(\d+)$").ok());
static SEASON_KEY: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"S(\d+)E\d+").ok());
static OTHER_QUALITY: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\b\d{3,}p\b").ok());
static BRACKET_GROUP: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\[[^\]]+\]").ok());
static DOWNLOAD_LINK: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"/download/(\d+)\.torrent").ok());

fn is_match(re: &Lazy<Option<Regex>>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

/// Whether a filename names a per-episode description file.
///
/// Season and show level description files share the extension and are
/// excluded by name.
pub fn is_episode_description(filename: &str) -> bool {
    filename.ends_with(".nfo") && !filename.contains("season") && !filename.contains("tvshow")
}

/// Text between `<tag>` and `</tag>`, case-insensitive, trimmed.
pub fn xml_tag(content: &str, tag: &str) -> Option<String> {
    let escaped = regex_lite::escape(tag);
    let re = Regex::new(&format!(r"(?is)<{escaped}>(.*?)</{escaped}>")).ok()?;
    let value = re.captures(content)?.get(1)?.as_str().trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Reads `Manga Chapter(s): N[-M]` from description file content.
///
/// A missing end chapter means the episode covers a single chapter.
pub fn chapter_range_from_description(content: &str) -> Option<ChapterRange> {
    let content = normalize_dash(content);
    let caps = DESCRIPTION_CHAPTERS.as_ref()?.captures(&content)?;
    let start: u32 = caps.get(1)?.as_str().parse().ok()?;
    let end: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => start,
    };
    ChapterRange::new(start, end)
}

/// Strict release-title form: `[One Pace][x-y] ...`.
///
/// Only the first comma separated element of the bracket counts, and a bare
/// chapter number becomes `n-n`.
pub fn release_title_range(title: &str) -> Option<ChapterRange> {
    let title = normalize_dash(title);
    let Some(caps) = RELEASE_TITLE.as_ref().and_then(|re| re.captures(&title)) else {
        debug!(title = %title, "No chapter bracket in release title");
        return None;
    };

    let info = caps.get(1)?.as_str();
    let first = info.split(',').next().unwrap_or_default().trim();

    if is_match(&ALL_DIGITS, first) || is_match(&DIGIT_RANGE, first) {
        return ChapterRange::parse(first);
    }

    debug!(chapter_info = %first, "Unrecognised chapter format");
    None
}

/// Looser filename form: the first bracketed `[a-b]` group anywhere.
pub fn bracketed_range(filename: &str) -> Option<ChapterRange> {
    let filename = normalize_dash(filename);
    let caps = BRACKETED_RANGE.as_ref()?.captures(&filename)?;
    let start = caps.get(1)?.as_str().parse().ok()?;
    let end = caps.get(2)?.as_str().parse().ok()?;
    ChapterRange::new(start, end)
}

/// Result of scanning a title for a `Chapter`/`Episode` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoughChapter {
    /// `Chapter 10-12`, usable as a table key.
    Range(ChapterRange),
    /// `Chapter 12`, usable only as an episode number.
    Single(u32),
    Nothing,
}

/// Finds whatever number follows `Chapter(s)` or `Episode(s)`.
pub fn rough_chapter_from_title(title: &str) -> RoughChapter {
    let title = normalize_dash(title);

    if let Some(caps) = ROUGH_RANGE.as_ref().and_then(|re| re.captures(&title)) {
        let bounds = caps
            .get(2)
            .zip(caps.get(3))
            .and_then(|(s, e)| Some((s.as_str().parse().ok()?, e.as_str().parse().ok()?)));
        if let Some(range) = bounds.and_then(|(s, e)| ChapterRange::new(s, e)) {
            return RoughChapter::Range(range);
        }
    }

    ROUGH_SINGLE
        .as_ref()
        .and_then(|re| re.captures(&title))
        .and_then(|caps| caps.get(2)?.as_str().parse().ok())
        .map_or(RoughChapter::Nothing, RoughChapter::Single)
}

/// `"Season 02"` -> `"02"`; anything else is treated as season `"00"`.
pub fn season_number_from_label(label: &str) -> String {
    let parts: Vec<&str> = label.split_whitespace().collect();
    match parts.as_slice() {
        [_, number] => (*number).to_string(),
        _ => "00".to_string(),
    }
}

/// `"S02E03"` -> `"03"`.
pub fn episode_number_from_key(key: &str) -> String {
    EPISODE_KEY
        .as_ref()
        .and_then(|re| re.captures(key))
        .and_then(|caps| caps.get(1))
        .map_or_else(|| "00".to_string(), |m| m.as_str().to_string())
}

/// `"S05E04"` -> `"05"`.
pub fn season_number_from_key(key: &str) -> String {
    SEASON_KEY
        .as_ref()
        .and_then(|re| re.captures(key))
        .and_then(|caps| caps.get(1))
        .map_or_else(|| "00".to_string(), |m| m.as_str().to_string())
}

/// Video quality label from a release title, `"n/a"` when absent.
pub fn parse_quality(title: &str) -> String {
    let lower = title.to_lowercase();
    for known in ["1080p", "720p", "480p"] {
        if lower.contains(known) {
            return known.to_string();
        }
    }

    OTHER_QUALITY
        .as_ref()
        .and_then(|re| re.find(&lower))
        .map_or_else(|| "n/a".to_string(), |m| m.as_str().to_string())
}

/// First non-bracketed text in a release title.
pub fn display_name_from_title(title: &str) -> String {
    let Some(re) = BRACKET_GROUP.as_ref() else {
        return title.trim().to_string();
    };
    re.split(title)
        .map(str::trim)
        .find(|part| !part.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

/// Numeric id from a `/download/<id>.torrent` link.
pub fn transfer_id_from_link(link: &str) -> Option<u64> {
    DOWNLOAD_LINK
        .as_ref()?
        .captures(link)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}
