//! Core data models for the retrieval pipeline.
//!
//! [`Document`]s come in from a document source, are cut into [`Chunk`]s
//! that live inside an immutable [`IndexSnapshot`], and leave the pipeline
//! as a [`RetrievalResult`] handed back to the caller.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A text file loaded from the document source.
///
/// Identity is the path relative to the knowledge root, always with `/`
/// separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: String,
    pub text: String,
}

impl Document {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// A bounded span of a document with precomputed lexical features.
///
/// Built by [`index::make_chunk`](crate::index::make_chunk), which refuses
/// to produce a chunk without tokens.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// `<source_path>#<ordinal>`.
    pub id: String,
    pub source_path: String,
    /// Position of this chunk within its source document, starting at 0.
    pub ordinal: usize,
    /// Whitespace-collapsed chunk text, original casing.
    pub normalized_text: String,
    /// Lower-cased `normalized_text`, used for phrase matching.
    pub search_text: String,
    pub token_frequency: HashMap<String, u32>,
    pub token_set: HashSet<String>,
    pub ngram_set: HashSet<String>,
    pub token_count: usize,
    /// SHA-256 of `normalized_text`.
    pub hash: String,
}

/// Immutable index over a whole corpus.
///
/// A new snapshot is built on every refresh and swapped in wholesale; the
/// previous one stays valid for as long as readers hold on to it.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    pub chunks: Vec<Chunk>,
    /// Number of chunks containing each token.
    pub document_frequency: HashMap<String, usize>,
    pub average_chunk_tokens: f64,
    pub file_count: usize,
    pub built_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl IndexSnapshot {
    /// A snapshot with no chunks and no error.
    pub fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            document_frequency: HashMap::new(),
            average_chunk_tokens: 0.0,
            file_count: 0,
            built_at: Utc::now(),
            last_error: None,
        }
    }

    /// An empty snapshot recording why the rebuild failed.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            last_error: Some(error.into()),
            ..Self::empty()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn document_frequency(&self, token: &str) -> usize {
        self.document_frequency.get(token).copied().unwrap_or(0)
    }
}

/// Per-signal breakdown of a chunk's relevance score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreMetrics {
    pub bm25: f64,
    pub phrase: f64,
    pub ngram: f64,
    pub coverage: f64,
}

/// A chunk paired with its score for one query.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub chunk: &'a Chunk,
    pub score: f64,
    pub metrics: ScoreMetrics,
}

/// One ranked snippet in a [`RetrievalResult`].
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub source: String,
    pub chunk_id: String,
    /// Content hash of the chunk, for detecting stale citations across rebuilds.
    pub hash: String,
    pub text: String,
    pub score: f64,
    pub metrics: ScoreMetrics,
}

/// A distinct source cited by a [`RetrievalResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub source: String,
}

/// Everything the caller gets back from one retrieval.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievalResult {
    pub matches: Vec<Match>,
    /// Unique sources, in match order.
    pub citations: Vec<Citation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_message: Option<String>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
