//! Title normalization
//!
//! Turns a noisy music-video style title ("Drake - God's Plan (Official Video)")
//! into a lower-cased `(artist, song)` pair suitable for catalog matching.
//!
//! Pipeline, in order:
//! - fold diacritics and curly quotes, lower-case
//! - strip `(...)`, `[...]` and `【...】` spans
//! - collapse `/` separated credits to spaces
//! - split on the artist/song delimiter, or guess a split by word count
//! - collapse dashes and `_` inside each segment to spaces
//! - strip channel noise words ("official", "vevo", ...) from the artist only

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// Bracketed annotations: "(Official Video)", "[Lyrics]", "【MV】".
static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]|【[^】]*】").unwrap());

/// Slash-separated alternate credits.
static SLASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*/\s*").unwrap());

/// A dash with whitespace on both sides is the preferred artist/song delimiter.
static SPACED_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s[-–—]+\s").unwrap());

/// Dashes of any width and underscores.
static HYPHENS_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-–—_]+").unwrap());

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-–—_/]+").unwrap());

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Words channels append to artist names.
pub const NOISE_WORDS: &[&str] = &[
    "official",
    "music",
    "vevo",
    "tv",
    "channel",
    "records",
    "entertainment",
    "media",
    "videos",
];

static NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:{})\b", NOISE_WORDS.join("|"))).unwrap()
});

/// Auto-generated YouTube channels are named "Artist - Topic".
static TOPIC_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[-–—]\s*topic\s*$").unwrap());

/// Canonical `(artist, song)` pair derived from a raw query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedQuery {
    pub artist: String,
    /// May be empty when the title had no discernible song segment.
    pub song: String,
}

impl NormalizedQuery {
    /// Both segments empty: nothing left to resolve.
    pub fn is_empty(&self) -> bool {
        self.artist.is_empty() && self.song.is_empty()
    }

    /// Text sent to the provider's full-text search.
    pub fn search_text(&self) -> String {
        if self.song.is_empty() {
            self.artist.clone()
        } else {
            format!("{} {}", self.artist, self.song)
        }
    }

    /// Stable key for caching a resolution of this query.
    pub fn cache_key(&self) -> String {
        format!("song:{}|{}", self.artist, self.song)
    }
}

/// Check if a character is a Unicode combining mark (diacritical mark).
fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// NFKD-decompose, drop combining marks, straighten curly quotes and lower-case.
/// e.g. "Beyoncé" → "beyonce", "God’s Plan" → "god's plan"
pub fn fold(s: &str) -> String {
    s.nfkd()
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{00B4}' | '\u{0060}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .collect()
}

fn collapse_spaces(s: &str) -> String {
    MULTI_SPACE.replace_all(s, " ").trim().to_string()
}

/// Comparable form of a provider-side artist name or title, aligned with
/// what [`normalize`] produces for queries.
pub fn match_form(s: &str) -> String {
    collapse_spaces(&SEPARATORS.replace_all(&fold(s), " "))
}

/// Bracket stripping, slash collapsing and whitespace cleanup, before any split.
fn clean_title(raw: &str) -> String {
    let folded = fold(raw);
    let without_brackets = BRACKETED.replace_all(&folded, " ");
    let without_slashes = SLASHES.replace_all(&without_brackets, " ");
    collapse_spaces(&without_slashes)
}

/// Hyphens and underscores inside a segment are word separators.
fn clean_segment(s: &str) -> String {
    collapse_spaces(&HYPHENS_UNDERSCORES.replace_all(s, " "))
}

/// Split on the first spaced dash, or failing that the first bare hyphen.
///
/// The first whitespace-surrounded `-`, `–` or `—` is the delimiter even when
/// a bare hyphen comes earlier, so "AC-DC - Thunderstruck" splits after "AC-DC".
fn split_delimiter(s: &str) -> Option<(&str, &str)> {
    if let Some(m) = SPACED_DASH.find(s) {
        return Some((&s[..m.start()], &s[m.end()..]));
    }
    s.split_once('-')
}

/// No delimiter: first two words are the artist when there are three or more.
fn guess_split(s: &str) -> (String, String) {
    let words: Vec<&str> = s.split_whitespace().collect();
    match words.len() {
        0 => (String::new(), String::new()),
        1 => (words[0].to_string(), String::new()),
        2 => (words[0].to_string(), words[1].to_string()),
        _ => (words[..2].join(" "), words[2..].join(" ")),
    }
}

/// Remove channel noise words. An artist made only of noise words is kept as is.
pub fn strip_noise_words(artist: &str) -> String {
    let stripped = collapse_spaces(&NOISE.replace_all(artist, " "));
    if stripped.is_empty() {
        artist.to_string()
    } else {
        stripped
    }
}

fn finish(artist: String, song: String) -> NormalizedQuery {
    let artist = strip_noise_words(&artist);
    if artist.is_empty() && !song.is_empty() {
        // "- Song": the whole cleaned query becomes the artist token
        return NormalizedQuery { artist: song, song: String::new() };
    }
    NormalizedQuery { artist, song }
}

/// Normalize a raw query into an `(artist, song)` pair.
pub fn normalize(raw: &str) -> NormalizedQuery {
    let cleaned = clean_title(raw);
    let (artist, song) = match split_delimiter(&cleaned) {
        Some((a, s)) => (clean_segment(a), clean_segment(s)),
        None => guess_split(&clean_segment(&cleaned)),
    };
    finish(artist, song)
}

/// Clean a channel name into an artist token: "DrakeVEVO", "Yeat - Topic".
pub fn channel_artist(channel: &str) -> String {
    let cleaned = clean_title(channel);
    let cleaned = TOPIC_SUFFIX.replace(&cleaned, "");
    let cleaned = clean_segment(&cleaned);
    let stripped = collapse_spaces(&NOISE.replace_all(&cleaned, " "));
    // Glued suffixes like "drakevevo" are not whole words
    stripped
        .strip_suffix("vevo")
        .map(str::trim_end)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or(stripped)
}

/// Like [`normalize`], using the uploading channel's name as the artist when the
/// title itself has no delimiter.
pub fn normalize_with_channel(raw: &str, channel: Option<&str>) -> NormalizedQuery {
    let cleaned = clean_title(raw);
    if split_delimiter(&cleaned).is_some() {
        return normalize(raw);
    }

    let artist = channel.map(channel_artist).unwrap_or_default();
    if artist.is_empty() {
        return normalize(raw);
    }

    let title = clean_segment(&cleaned);
    let song = match title.strip_prefix(artist.as_str()) {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim().to_string(),
        _ => title,
    };
    finish(artist, song)
}
