//! Maximal Marginal Relevance (MMR) diversification.
//!
//! Greedily picks candidates maximizing
//!
//! ```text
//! mmr = λ × score / max_score − (1 − λ) × max(similarity(candidate, selected))
//! ```
//!
//! where similarity is `0.55 × token Jaccard + 0.45 × n-gram Jaccard`.
//!
//! λ = 1.0: pure relevance. λ = 0.0: pure anti-redundancy.

use std::collections::HashSet;
use std::hash::Hash;

use crate::models::{Chunk, ScoredCandidate};
use crate::score::intersection_count;

const TOKEN_SIMILARITY_WEIGHT: f64 = 0.55;
const NGRAM_SIMILARITY_WEIGHT: f64 = 0.45;

/// `|A ∩ B| / |A ∪ B|`, or 0 when both sets are empty.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let inter = intersection_count(a, b);
    let union = a.len() + b.len() - inter;
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// Redundancy between two chunks, in `[0, 1]`.
pub fn chunk_similarity(a: &Chunk, b: &Chunk) -> f64 {
    let sim = TOKEN_SIMILARITY_WEIGHT * jaccard(&a.token_set, &b.token_set)
        + NGRAM_SIMILARITY_WEIGHT * jaccard(&a.ngram_set, &b.ngram_set);
    sim.clamp(0.0, 1.0)
}

/// Reduce a relevance-sorted candidate pool to at most `top_k` diverse items.
///
/// A pool no larger than `top_k` is returned as is. Otherwise items are
/// selected greedily by MMR score, ties going to the earlier pool entry,
/// and the selection is returned re-sorted by relevance.
pub fn diversify<'a>(
    candidates: Vec<ScoredCandidate<'a>>,
    top_k: usize,
    lambda: f64,
) -> Vec<ScoredCandidate<'a>> {
    if candidates.len() <= top_k {
        return candidates;
    }
    if top_k == 0 {
        return Vec::new();
    }

    let lambda = lambda.clamp(0.0, 1.0);
    let max_score = candidates
        .iter()
        .map(|c| c.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let max_score = if max_score > 0.0 { max_score } else { 1.0 };

    let mut remaining = candidates;
    let mut selected: Vec<ScoredCandidate<'a>> = Vec::with_capacity(top_k);

    while selected.len() < top_k && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_mmr = f64::NEG_INFINITY;

        for (idx, cand) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|s| chunk_similarity(cand.chunk, s.chunk))
                .fold(0.0, f64::max);
            let mmr = lambda * (cand.score / max_score) - (1.0 - lambda) * redundancy;
            if mmr > best_mmr {
                best_mmr = mmr;
                best_idx = idx;
            }
        }

        selected.push(remaining.remove(best_idx));
    }

    selected.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    selected
}
