//! Fuzzy name matching.
//!
//! Scores are percentages in `0..=100`. A candidate's score against a query is
//! the better of a word-order-insensitive comparison and a best-substring
//! comparison, both on normalized text, so "Putin Vladimir" matches
//! "Vladimir Putin" and "putin" matches "Vladimir Putin".

/// Honorifics and generational suffixes that carry no identity
const IGNORED_TOKENS: &[&str] = &[
    "mr", "mrs", "ms", "miss", "dr", "prof", "professor", "sir", "lord", "lady", "hon", "rev",
    "fr", "sr", "jr", "ii", "iii", "iv", "esq",
];

/// Lowercase, turn punctuation into spaces, drop honorific tokens, collapse whitespace
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| !IGNORED_TOKENS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncates, so only identical strings reach 100
fn to_percent(similarity: f64) -> u8 {
    (similarity * 100.0 + 1e-9).floor().clamp(0.0, 100.0) as u8
}

/// Edit-distance similarity of the raw strings
pub fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() && b.is_empty() {
        return 100;
    }
    to_percent(strsim::normalized_levenshtein(a, b))
}

/// [`ratio`] after sorting each side's tokens alphabetically
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Best [`ratio`] of the shorter string against every equal-length window of the longer
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let (short, long): (Vec<char>, Vec<char>) = {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        if a.len() <= b.len() {
            (a, b)
        } else {
            (b, a)
        }
    };

    if short.is_empty() {
        return if long.is_empty() { 100 } else { 0 };
    }

    let needle: String = short.iter().collect();
    let mut best = 0;
    for window in long.windows(short.len()) {
        let candidate: String = window.iter().collect();
        best = best.max(ratio(&needle, &candidate));
        if best == 100 {
            break;
        }
    }
    best
}

/// Fuzzy scorer with a default threshold for filtering
#[derive(Debug, Clone, Copy)]
pub struct FuzzyScorer {
    threshold: u8,
}

impl Default for FuzzyScorer {
    fn default() -> Self {
        Self::new(80)
    }
}

impl FuzzyScorer {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: threshold.min(100),
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Similarity of two names; `0` when either normalizes to nothing
    pub fn score(&self, query: &str, candidate: &str) -> u8 {
        let query = normalize(query);
        let candidate = normalize(candidate);
        if query.is_empty() || candidate.is_empty() {
            return 0;
        }

        let token_score = token_sort_ratio(&query, &candidate);
        let partial_score = partial_ratio(&query, &candidate);
        let score = token_score.max(partial_score);

        tracing::trace!(%query, %candidate, token_score, partial_score, score, "Fuzzy score calculated");
        score
    }

    pub fn is_match(&self, query: &str, candidate: &str, threshold: u8) -> (bool, u8) {
        let score = self.score(query, candidate);
        (score >= threshold, score)
    }

    /// Candidates at or above the threshold as `(candidate, score, index)`,
    /// best first; ties keep input order
    pub fn filter_matches<'a>(
        &self,
        query: &str,
        candidates: &'a [String],
        limit: Option<usize>,
    ) -> Vec<(&'a str, u8, usize)> {
        let mut matches: Vec<(&str, u8, usize)> = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| {
                let score = self.score(query, candidate);
                (score >= self.threshold).then_some((candidate.as_str(), score, index))
            })
            .collect();

        matches.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(limit) = limit {
            matches.truncate(limit);
        }

        tracing::debug!(
            candidates_count = candidates.len(),
            matches_count = matches.len(),
            "Fuzzy matches filtered"
        );
        matches
    }

    pub fn best_match<'a>(&self, query: &str, candidates: &'a [String]) -> Option<(&'a str, u8)> {
        self.filter_matches(query, candidates, Some(1))
            .into_iter()
            .next()
            .map(|(candidate, score, _)| (candidate, score))
    }
}
