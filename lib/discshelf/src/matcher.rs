use shared::media::{MediaItem, MediaType};
use shared::scan::MatchCandidate;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::normalize::normalize;

/// Scores below this never resolve a scan automatically.
pub const ACCEPT_THRESHOLD: f64 = 70.0;
/// Required lead of the best candidate over the runner-up.
pub const MIN_MARGIN: f64 = 10.0;
pub const YEAR_PENALTY: f64 = 15.0;
pub const YEAR_TOLERANCE: i32 = 1;
pub const TYPE_PENALTY: f64 = 25.0;
pub const DEFAULT_TOP_N: usize = 5;

// --- Similarity Functions ---

fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

fn join_parts(head: &str, tail: &[&str]) -> String {
    if tail.is_empty() {
        head.to_string()
    } else if head.is_empty() {
        tail.join(" ")
    } else {
        format!("{head} {}", tail.join(" "))
    }
}

/// Token-set similarity in `[0, 100]`.
///
/// Both strings are split into word sets, so word order and duplicated words
/// do not matter. When one set is contained in the other the score is 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let a_words: BTreeSet<&str> = a.split_whitespace().collect();
    let b_words: BTreeSet<&str> = b.split_whitespace().collect();
    if a_words.is_empty() || b_words.is_empty() {
        return 0.0;
    }

    let common: Vec<&str> = a_words.intersection(&b_words).copied().collect();
    let only_a: Vec<&str> = a_words.difference(&b_words).copied().collect();
    let only_b: Vec<&str> = b_words.difference(&a_words).copied().collect();

    let sect = common.join(" ");
    let with_a = join_parts(&sect, &only_a);
    let with_b = join_parts(&sect, &only_b);

    if sect.is_empty() {
        return ratio(&with_a, &with_b);
    }
    ratio(&sect, &with_a)
        .max(ratio(&sect, &with_b))
        .max(ratio(&with_a, &with_b))
}

#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    pub accept_threshold: f64,
    pub min_margin: f64,
    pub year_penalty: f64,
    pub year_tolerance: i32,
    pub type_penalty: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            accept_threshold: ACCEPT_THRESHOLD,
            min_margin: MIN_MARGIN,
            year_penalty: YEAR_PENALTY,
            year_tolerance: YEAR_TOLERANCE,
            type_penalty: TYPE_PENALTY,
        }
    }
}

struct Scored<'a> {
    item: &'a MediaItem,
    score: f64,
    exact_title: bool,
    exact_year: bool,
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Final score of one candidate. Year and type disagreements cost points
    /// but never exclude a candidate.
    pub fn score(
        &self,
        query_title: &str,
        query_year: Option<i32>,
        query_type: Option<MediaType>,
        item: &MediaItem,
    ) -> f64 {
        let mut score = token_set_ratio(query_title, &item.normalized_title);

        if let (Some(wanted), Some(year)) = (query_year, item.year) {
            if (wanted - year).abs() > self.year_tolerance {
                score -= self.year_penalty;
            }
        }
        if let Some(wanted) = query_type {
            if wanted != item.media_type {
                score -= self.type_penalty;
            }
        }

        score.clamp(0.0, 100.0)
    }

    /// Rank `candidates` against the query, best first, keeping `top_n`.
    ///
    /// Ties are broken by an exact title match, then an exact year match,
    /// then by the newer release, then by title so the order is stable.
    pub fn search(
        &self,
        query_title: &str,
        query_year: Option<i32>,
        query_type: Option<MediaType>,
        candidates: &[MediaItem],
        top_n: usize,
    ) -> Vec<MatchCandidate> {
        let query = normalize(query_title);
        if query.is_empty() {
            return vec![];
        }

        let mut scored: Vec<Scored> = candidates
            .iter()
            .map(|item| Scored {
                item,
                score: self.score(&query, query_year, query_type, item),
                exact_title: item.normalized_title == query,
                exact_year: query_year.is_some() && query_year == item.year,
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.exact_title.cmp(&a.exact_title))
                .then_with(|| b.exact_year.cmp(&a.exact_year))
                .then_with(|| b.item.year.cmp(&a.item.year))
                .then_with(|| a.item.title.cmp(&b.item.title))
                .then_with(|| a.item.id.cmp(&b.item.id))
        });
        scored.truncate(top_n);

        scored
            .into_iter()
            .map(|s| MatchCandidate {
                id: s.item.id,
                title: s.item.title.clone(),
                year: s.item.year,
                media_type: s.item.media_type,
                similarity: s.score,
                has_physical: s.item.has_physical,
                exact_title: s.exact_title,
            })
            .collect()
    }

    /// Whether the top-ranked candidate may be acted on without asking.
    ///
    /// The margin rule is waived for an unpenalized exact title match whose
    /// runner-up is not exact: "toy story" picks "Toy Story" over "Toy Story 2"
    /// even though the token-set ratio scores both at 100.
    pub fn is_confident(&self, ranked: &[MatchCandidate]) -> bool {
        let Some(top) = ranked.first() else {
            return false;
        };
        if top.similarity <= self.accept_threshold {
            return false;
        }
        let Some(runner_up) = ranked.get(1) else {
            return true;
        };
        if top.similarity - runner_up.similarity >= self.min_margin {
            return true;
        }
        top.exact_title && top.similarity >= 100.0 && !runner_up.exact_title
    }
}
