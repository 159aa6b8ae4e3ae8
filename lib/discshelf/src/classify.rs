use regex::Regex;
use shared::media::MediaType;
use std::sync::LazyLock;

static RE_SERIES_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:seasons?|series|episodes?|mini-?series|complete\s+collection|tv|television)\b",
    )
    .unwrap()
});

/// Guess whether a product description is a movie or a series.
///
/// Movies are the default since most scanned discs are films. This is only a
/// hint: the matcher penalizes a type mismatch instead of excluding it.
pub fn classify(raw_description: &str) -> MediaType {
    if RE_SERIES_HINT.is_match(raw_description) {
        MediaType::Series
    } else {
        MediaType::Movie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_vocabulary() {
        assert_eq!(classify("The Office: Season 3"), MediaType::Series);
        assert_eq!(classify("Firefly - The Complete Series"), MediaType::Series);
        assert_eq!(classify("Band of Brothers (Miniseries)"), MediaType::Series);
        assert_eq!(classify("Planet Earth: All 11 Episodes"), MediaType::Series);
        assert_eq!(classify("Looney Tunes Complete Collection"), MediaType::Series);
        assert_eq!(classify("Twin Peaks TV"), MediaType::Series);
    }

    #[test]
    fn test_movies_are_the_default() {
        assert_eq!(
            classify("The Matrix (1999) Widescreen Special Edition Disc 1"),
            MediaType::Movie
        );
        assert_eq!(classify("Garfield Movie"), MediaType::Movie);
        assert_eq!(classify(""), MediaType::Movie);
    }

    #[test]
    fn test_whole_words_only() {
        // "tv" inside a word and "series" as a prefix must not trigger
        assert_eq!(classify("Stvdio 54"), MediaType::Movie);
        assert_eq!(classify("Seriesless"), MediaType::Movie);
    }
}
