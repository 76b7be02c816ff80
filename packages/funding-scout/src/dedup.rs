//! Two-stage deduplication of search hits.
//!
//! 1. Exact: hits sharing a `link` collapse to the first occurrence.
//! 2. Near-duplicate: hits whose titles or snippets have a term-frequency cosine
//!    similarity above [`NEAR_DUPLICATE_THRESHOLD`] collapse to the one with the
//!    higher source weight.
//!
//! The pairwise pass is O(n²), which is fine for the tens to low hundreds of
//! hits a run produces.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::search::RawHit;

/// Similarity strictly above this marks two hits as the same story.
pub const NEAR_DUPLICATE_THRESHOLD: f64 = 0.8;

/// Result of a dedup pass.
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// Survivors, highest weight first.
    pub hits: Vec<RawHit>,
    pub exact_duplicates: usize,
    pub near_duplicates: usize,
}

/// Case-folded tokens split on whitespace and punctuation.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

pub fn term_frequencies(text: &str) -> HashMap<String, usize> {
    let mut freq = HashMap::new();
    for token in tokenize(text) {
        *freq.entry(token).or_insert(0) += 1;
    }
    freq
}

/// Cosine similarity of the term-frequency vectors of `a` and `b`.
///
/// Returns 0.0 when either side has no tokens.
pub fn cosine_similarity(a: &str, b: &str) -> f64 {
    let fa = term_frequencies(a);
    let fb = term_frequencies(b);
    if fa.is_empty() || fb.is_empty() {
        return 0.0;
    }

    let dot: f64 = fa
        .iter()
        .filter_map(|(term, &x)| fb.get(term).map(|&y| (x * y) as f64))
        .sum();
    let norm_a = fa.values().map(|&x| (x * x) as f64).sum::<f64>().sqrt();
    let norm_b = fb.values().map(|&y| (y * y) as f64).sum::<f64>().sqrt();

    dot / (norm_a * norm_b)
}

pub fn is_near_duplicate(a: &RawHit, b: &RawHit) -> bool {
    cosine_similarity(&a.title, &b.title) > NEAR_DUPLICATE_THRESHOLD
        || cosine_similarity(&a.snippet, &b.snippet) > NEAR_DUPLICATE_THRESHOLD
}

/// Drop later hits whose link was already seen.
pub fn dedupe_by_link(hits: Vec<RawHit>) -> (Vec<RawHit>, usize) {
    let total = hits.len();
    let mut seen = HashSet::new();
    let unique: Vec<RawHit> = hits
        .into_iter()
        .filter(|hit| seen.insert(hit.link.clone()))
        .collect();
    let removed = total - unique.len();
    (unique, removed)
}

/// Collapse near-duplicates, always keeping the higher-weight hit.
///
/// Hits are visited in descending weight order and each one is kept only if it
/// is not a near-duplicate of an already kept hit, so every discarded hit has a
/// kept counterpart of equal or greater weight. Running this on its own output
/// removes nothing.
pub fn collapse_near_duplicates(mut hits: Vec<RawHit>) -> (Vec<RawHit>, usize) {
    hits.sort_by(|a, b| b.weight.total_cmp(&a.weight));

    let mut kept: Vec<RawHit> = Vec::with_capacity(hits.len());
    let mut removed = 0;

    for hit in hits {
        match kept.iter().find(|k| is_near_duplicate(k, &hit)) {
            Some(survivor) => {
                debug!(
                    kept = %survivor.link,
                    kept_weight = survivor.weight,
                    dropped = %hit.link,
                    dropped_weight = hit.weight,
                    "Collapsed near-duplicate hit"
                );
                removed += 1;
            }
            None => kept.push(hit),
        }
    }

    (kept, removed)
}

/// Run both stages.
pub fn deduplicate(hits: Vec<RawHit>) -> DedupOutcome {
    let (unique, exact_duplicates) = dedupe_by_link(hits);
    let (hits, near_duplicates) = collapse_near_duplicates(unique);

    DedupOutcome {
        hits,
        exact_duplicates,
        near_duplicates,
    }
}
