//! Title cleanup for retail product descriptions.
//!
//! UPC databases describe a disc the way a shop lists it ("The Matrix (1999)
//! Widescreen Special Edition Disc 1"). Matching wants the bare title.

use regex::Regex;
use std::sync::LazyLock;

static RE_BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[\(\[\{][^\)\]\}]*[\)\]\}]").unwrap());

// Retail/edition vocabulary. Longer phrases come first so "special edition"
// wins over a bare "edition".
static RE_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)\b(?:
            (?:the\s+)?complete\s+(?:first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth|final)\s+season
          | (?:the\s+)?complete\s+(?:series|collection|seasons?)
          | seasons?\s*\d+(?:\s*(?:-|&|to)\s*\d+)?
          | (?:volume|vol\.?)\s*\d+
          | \d+\s*-?\s*discs?(?:\s+set)?
          | discs?(?:\s+set)?(?:\s*\d+)?
          | (?:special|collector'?s|anniversary|limited|deluxe|extended|ultimate|platinum|definitive)\s+edition
          | edition
          | director'?s\s+cut
          | widescreen
          | full\s*-?\s*screen
          | unrated
          | region\s*\d
          | dvd
          | blu\s*-?\s*ray
          | digital(?:\s+copy)?
          | mill\s+creek
        )\b",
    )
    .unwrap()
});

static RE_NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static RE_BRACKETED_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\(\[]\s*((?:19|20)\d{2})\s*[\)\]]").unwrap());

fn strip_noise(raw: &str) -> String {
    let text = raw.replace('\u{2019}', "'").replace('_', " ");
    let text = RE_BRACKETED.replace_all(&text, " ");
    RE_NOISE.replace_all(&text, " ").into_owned()
}

fn collapse(text: &str) -> String {
    RE_SPACES.replace_all(text, " ").trim().to_string()
}

/// Lower-cased, noise-free title used for matching and for the uniqueness key.
///
/// Pure and total: garbage in gives an empty string, which callers treat as
/// "no usable title".
pub fn normalize(raw_description: &str) -> String {
    let stripped = strip_noise(raw_description).to_lowercase();
    let stripped = stripped.replace('\'', "");
    let stripped = RE_NON_WORD.replace_all(&stripped, " ");
    collapse(&stripped)
}

/// Case-preserving version of [`normalize`] suitable for display.
pub fn display_title(raw_description: &str) -> String {
    let stripped = collapse(&strip_noise(raw_description));
    stripped
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | ',' | '/' | '|'))
        .to_string()
}

/// Release year from a description. Only a bracketed year counts: a bare
/// number is part of the title in "Blade Runner 2049" or "2001: A Space Odyssey".
pub fn extract_year(raw_description: &str) -> Option<i32> {
    RE_BRACKETED_YEAR
        .captures(raw_description)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
