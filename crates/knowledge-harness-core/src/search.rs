//! End-to-end retrieval over an index snapshot.
//!
//! # Pipeline
//!
//! 1. Extract [`QueryFeatures`] from the query text.
//! 2. Score every chunk ([`score::rank_candidates`]), keeping chunks that
//!    share a token with the query and reach `min_score`.
//! 3. Truncate to a pool of `top_k × candidate_multiplier`.
//! 4. Diversify the pool down to `top_k` with MMR.
//! 5. Collect citations and assemble the prompt context.
//!
//! The function is pure: the caller owns the snapshot and decides when it
//! is rebuilt.

use crate::context::assemble_context;
use crate::mmr::diversify;
use crate::models::{Citation, IndexSnapshot, Match, RetrievalResult};
use crate::score::{rank_candidates, Bm25Params};
use crate::tokenize::QueryFeatures;

/// Retrieval tuning parameters, decoupled from application config.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalParams {
    /// Maximum number of matches returned.
    pub top_k: usize,
    /// Candidates scoring below this are discarded.
    pub min_score: f64,
    /// Candidate pool size as a multiple of `top_k`.
    pub candidate_multiplier: usize,
    /// MMR trade-off: 1.0 = relevance only, 0.0 = diversity only.
    pub mmr_lambda: f64,
    pub bm25: Bm25Params,
    /// Must match the n-gram size the snapshot was built with.
    pub ngram_size: usize,
    /// Character budget for the assembled context blocks.
    pub context_max_chars: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_score: 0.2,
            candidate_multiplier: 4,
            mmr_lambda: 0.72,
            bm25: Bm25Params::default(),
            ngram_size: 3,
            context_max_chars: 6000,
        }
    }
}

impl RetrievalParams {
    pub fn pool_size(&self) -> usize {
        self.top_k.saturating_mul(self.candidate_multiplier.max(1))
    }
}

/// Run a query against a snapshot.
///
/// Blank queries, token-less queries, and empty snapshots return
/// [`RetrievalResult::default`].
pub fn retrieve(snapshot: &IndexSnapshot, query: &str, params: &RetrievalParams) -> RetrievalResult {
    if query.trim().is_empty() || snapshot.is_empty() || params.top_k == 0 {
        return RetrievalResult::default();
    }

    let features = QueryFeatures::new(query, params.ngram_size);
    let pool = rank_candidates(
        snapshot,
        &features,
        &params.bm25,
        params.min_score,
        params.pool_size(),
    );
    let selected = diversify(pool, params.top_k, params.mmr_lambda);

    let matches: Vec<Match> = selected
        .into_iter()
        .map(|c| Match {
            source: c.chunk.source_path.clone(),
            chunk_id: c.chunk.id.clone(),
            hash: c.chunk.hash.clone(),
            text: c.chunk.normalized_text.clone(),
            score: c.score,
            metrics: c.metrics,
        })
        .collect();

    let mut citations: Vec<Citation> = Vec::new();
    for m in &matches {
        if !citations.iter().any(|c| c.source == m.source) {
            citations.push(Citation {
                source: m.source.clone(),
            });
        }
    }

    let context_message = assemble_context(&matches, params.context_max_chars);

    RetrievalResult {
        matches,
        citations,
        context_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{build_snapshot, IndexParams};
    use crate::models::Document;

    fn policy_snapshot() -> IndexSnapshot {
        let docs = vec![Document::new(
            "policy.md",
            "Vacation requests must be submitted 2 weeks in advance.\n\n\
             Sick leave does not require advance notice.",
        )];
        // Small chunks so each paragraph is indexed on its own.
        build_snapshot(
            &docs,
            &IndexParams {
                max_chars: 60,
                ngram_size: 3,
            },
        )
    }

    #[test]
    fn test_vacation_query_scenario() {
        let snap = policy_snapshot();
        assert_eq!(snap.chunk_count(), 2);

        let result = retrieve(&snap, "how many weeks notice for vacation", &RetrievalParams::default());
        assert!(!result.matches.is_empty());
        assert!(result.matches[0].text.starts_with("Vacation requests"));
        assert_eq!(
            result.citations,
            vec![Citation {
                source: "policy.md".to_string()
            }]
        );
        let ctx = result.context_message.unwrap();
        assert!(ctx.contains("Vacation requests must be submitted 2 weeks in advance."));
    }

    #[test]
    fn test_whitespace_query_is_empty() {
        let result = retrieve(&policy_snapshot(), "  \t\n ", &RetrievalParams::default());
        assert!(result.matches.is_empty());
        assert!(result.citations.is_empty());
        assert!(result.context_message.is_none());
    }

    #[test]
    fn test_unrelated_query_is_empty() {
        let result = retrieve(&policy_snapshot(), "kubernetes deployment", &RetrievalParams::default());
        assert!(result.is_empty());
        assert!(result.context_message.is_none());
    }

    #[test]
    fn test_empty_snapshot_is_empty() {
        let result = retrieve(&IndexSnapshot::empty(), "vacation", &RetrievalParams::default());
        assert!(result.is_empty());
    }

    #[test]
    fn test_matches_bounded_by_top_k() {
        let docs: Vec<Document> = (0..10)
            .map(|i| Document::new(format!("d{}.md", i), format!("shared topic number {}", i)))
            .collect();
        let snap = build_snapshot(&docs, &IndexParams::default());
        let params = RetrievalParams {
            top_k: 3,
            min_score: 0.0,
            ..RetrievalParams::default()
        };
        let result = retrieve(&snap, "shared topic", &params);
        assert_eq!(result.matches.len(), 3);
        assert_eq!(result.citations.len(), 3);
        for pair in result.matches.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_citations_unique_in_match_order() {
        let docs = vec![
            Document::new("a.md", "billing invoices\n\nbilling refunds"),
            Document::new("b.md", "billing disputes"),
        ];
        let snap = build_snapshot(&docs, &IndexParams { max_chars: 20, ngram_size: 3 });
        assert_eq!(snap.chunk_count(), 3);
        let params = RetrievalParams {
            min_score: 0.0,
            ..RetrievalParams::default()
        };
        let result = retrieve(&snap, "billing", &params);
        assert_eq!(result.matches.len(), 3);
        assert_eq!(result.citations.len(), 2);
        let sources: Vec<&str> = result.citations.iter().map(|c| c.source.as_str()).collect();
        let mut expected: Vec<&str> = Vec::new();
        for m in &result.matches {
            if !expected.contains(&m.source.as_str()) {
                expected.push(m.source.as_str());
            }
        }
        assert_eq!(sources, expected);
    }
}
