//! Hybrid lexical relevance scoring.
//!
//! Each chunk is scored against the query with four independent,
//! non-negative signals:
//!
//! | Signal | Rewards |
//! |--------|---------|
//! | BM25 | weighted term matches, normalized by chunk length |
//! | phrase | literal occurrences of query phrases |
//! | n-gram | fuzzy character overlap, typo tolerant |
//! | coverage | fraction of distinct query tokens present |
//!
//! combined as `bm25 + phrase + 2.2 × ngram + 1.2 × coverage`.
//!
//! Scoring is a pure function of `(chunk, query, snapshot)`, so chunks can be
//! scored in any order without changing the result.

use std::collections::HashSet;
use std::hash::Hash;

use crate::models::{Chunk, IndexSnapshot, ScoreMetrics, ScoredCandidate};
use crate::tokenize::{token_weight, QueryFeatures};

const NGRAM_WEIGHT: f64 = 2.2;
const COVERAGE_WEIGHT: f64 = 1.2;

const LONG_PHRASE_CHARS: usize = 8;
const LONG_PHRASE_BONUS: f64 = 1.5;
const SHORT_PHRASE_BONUS: f64 = 0.7;
const FULL_QUERY_BONUS: f64 = 2.0;

/// BM25 tuning constants.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length normalization strength, `0.0..=1.0`.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Count of shared elements, iterating the smaller set.
pub fn intersection_count<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> usize {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|x| large.contains(*x)).count()
}

/// Inverse document frequency, always positive.
pub fn idf(total_chunks: usize, df: usize) -> f64 {
    let n = total_chunks as f64;
    let df = df as f64;
    (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
}

/// Contribution of one term to a chunk's BM25 score, before token weighting.
pub fn bm25_term(
    tf: f64,
    idf: f64,
    chunk_len: f64,
    avg_len: f64,
    params: &Bm25Params,
) -> f64 {
    if tf <= 0.0 {
        return 0.0;
    }
    let avg_len = if avg_len > 0.0 { avg_len } else { chunk_len.max(1.0) };
    let norm = params.k1 * (1.0 - params.b + params.b * chunk_len / avg_len);
    idf * tf * (params.k1 + 1.0) / (tf + norm)
}

pub fn bm25_score(
    chunk: &Chunk,
    query: &QueryFeatures,
    snapshot: &IndexSnapshot,
    params: &Bm25Params,
) -> f64 {
    let n = snapshot.chunk_count();
    let chunk_len = chunk.token_count as f64;

    query
        .unique_tokens
        .iter()
        .filter_map(|token| {
            let tf = *chunk.token_frequency.get(token)? as f64;
            let idf = idf(n, snapshot.document_frequency(token));
            Some(
                bm25_term(tf, idf, chunk_len, snapshot.average_chunk_tokens, params)
                    * token_weight(token),
            )
        })
        .sum()
}

pub fn phrase_score(chunk: &Chunk, query: &QueryFeatures) -> f64 {
    let mut score: f64 = query
        .phrases
        .iter()
        .filter(|p| chunk.search_text.contains(p.as_str()))
        .map(|p| {
            if p.chars().count() >= LONG_PHRASE_CHARS {
                LONG_PHRASE_BONUS
            } else {
                SHORT_PHRASE_BONUS
            }
        })
        .sum();

    if query.normalized_text.chars().count() >= LONG_PHRASE_CHARS
        && chunk.search_text.contains(query.normalized_text.as_str())
    {
        score += FULL_QUERY_BONUS;
    }
    score
}

/// `|A ∩ B| / sqrt(|A| × |B|)`, or 0 when either set is empty.
pub fn ngram_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    intersection_count(a, b) as f64 / ((a.len() * b.len()) as f64).sqrt()
}

/// Fraction of distinct query tokens found in the chunk.
pub fn coverage(chunk: &Chunk, query: &QueryFeatures) -> f64 {
    if query.unique_tokens.is_empty() {
        return 0.0;
    }
    let hits = query
        .unique_tokens
        .iter()
        .filter(|t| chunk.token_set.contains(t.as_str()))
        .count();
    hits as f64 / query.unique_tokens.len() as f64
}

/// Score one chunk against a query.
pub fn score_chunk(
    chunk: &Chunk,
    query: &QueryFeatures,
    snapshot: &IndexSnapshot,
    params: &Bm25Params,
) -> (f64, ScoreMetrics) {
    let metrics = ScoreMetrics {
        bm25: bm25_score(chunk, query, snapshot, params),
        phrase: phrase_score(chunk, query),
        ngram: ngram_similarity(&query.ngram_set, &chunk.ngram_set),
        coverage: coverage(chunk, query),
    };
    let score = metrics.bm25
        + metrics.phrase
        + metrics.ngram * NGRAM_WEIGHT
        + metrics.coverage * COVERAGE_WEIGHT;
    (score, metrics)
}

/// Score every chunk and return the relevance-sorted candidate pool.
///
/// Only chunks sharing at least one token with the query and scoring at
/// least `min_score` are kept. Ties keep snapshot order. The pool is
/// truncated to `pool_size`.
pub fn rank_candidates<'a>(
    snapshot: &'a IndexSnapshot,
    query: &QueryFeatures,
    params: &Bm25Params,
    min_score: f64,
    pool_size: usize,
) -> Vec<ScoredCandidate<'a>> {
    if query.is_empty() || snapshot.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<ScoredCandidate<'a>> = snapshot
        .chunks
        .iter()
        .filter_map(|chunk| {
            let (score, metrics) = score_chunk(chunk, query, snapshot, params);
            (metrics.coverage > 0.0 && score >= min_score).then_some(ScoredCandidate {
                chunk,
                score,
                metrics,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(pool_size);
    candidates
}
