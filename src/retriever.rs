//! The retriever: the API a chat pipeline calls once per turn.
//!
//! Wraps a [`KnowledgeCache`] and the core retrieval pipeline. Nothing here
//! returns an error for data problems: a missing knowledge directory or a
//! blank query simply produce an empty [`RetrievalResult`], and the cause
//! (if any) shows up in [`RetrieverStatus::last_error`].

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

use knowledge_harness_core::models::{IndexSnapshot, RetrievalResult};
use knowledge_harness_core::search::{retrieve, RetrievalParams};

use crate::cache::KnowledgeCache;
use crate::config::Config;
use crate::source::{DocumentSource, FilesystemSource};

/// Health snapshot for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct RetrieverStatus {
    pub enabled: bool,
    pub files: usize,
    pub chunk_count: usize,
    pub average_chunk_tokens: f64,
    pub top_k: usize,
    pub min_score: f64,
    pub mmr_lambda: f64,
    pub last_error: Option<String>,
    /// RFC 3339 build time of the current snapshot, if one was built.
    pub loaded_at: Option<String>,
}

pub struct Retriever {
    enabled: bool,
    params: RetrievalParams,
    cache: KnowledgeCache,
}

impl Retriever {
    /// Numeric options are clamped into range, as when loading from TOML.
    pub fn new(config: &Config, source: Box<dyn DocumentSource>) -> Self {
        let config = config.clone().clamped();
        Self {
            enabled: config.knowledge.enabled,
            params: config.retrieval_params(),
            cache: KnowledgeCache::new(source, config.index_params(), config.cache_ttl()),
        }
    }

    /// Retriever over the configured knowledge directory.
    ///
    /// Fails only on invalid glob patterns; a missing directory is reported
    /// through [`status`](Self::status) instead.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = FilesystemSource::from_config(config)?;
        Ok(Self::new(config, Box::new(source)))
    }

    /// Find snippets relevant to `query`.
    pub fn retrieve(&self, query: &str) -> RetrievalResult {
        if !self.enabled || query.trim().is_empty() {
            return RetrievalResult::default();
        }

        let snapshot = self.cache.ensure_fresh();
        let result = retrieve(&snapshot, query, &self.params);
        tracing::debug!(
            query_chars = query.chars().count(),
            chunks = snapshot.chunk_count(),
            matches = result.matches.len(),
            "retrieval complete"
        );
        result
    }

    /// Force a rebuild and return the new snapshot.
    ///
    /// A disabled retriever never touches the source and returns an empty
    /// snapshot.
    pub fn refresh(&self) -> Arc<IndexSnapshot> {
        if !self.enabled {
            return Arc::new(IndexSnapshot::empty());
        }
        self.cache.rebuild()
    }

    /// Report the state of the current snapshot without rebuilding it.
    pub fn status(&self) -> RetrieverStatus {
        let snapshot = self.cache.current();
        let snap = snapshot.as_deref();

        RetrieverStatus {
            enabled: self.enabled,
            files: snap.map_or(0, |s| s.file_count),
            chunk_count: snap.map_or(0, |s| s.chunk_count()),
            average_chunk_tokens: snap.map_or(0.0, |s| s.average_chunk_tokens),
            top_k: self.params.top_k,
            min_score: self.params.min_score,
            mmr_lambda: self.params.mmr_lambda,
            last_error: snap.and_then(|s| s.last_error.clone()),
            loaded_at: snap.map(|s| s.built_at.to_rfc3339()),
        }
    }
}
