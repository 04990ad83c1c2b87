//! TOML configuration.
//!
//! ```toml
//! [knowledge]
//! dir = "./knowledge"
//! cache_ttl_secs = 60
//!
//! [chunking]
//! max_chars = 900
//!
//! [retrieval]
//! top_k = 4
//! mmr_lambda = 0.72
//! ```
//!
//! Only `knowledge.dir` is required. Numeric options are clamped into
//! sane ranges instead of being rejected.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use knowledge_harness_core::index::IndexParams;
use knowledge_harness_core::score::Bm25Params;
use knowledge_harness_core::search::RetrievalParams;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KnowledgeConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub dir: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_enabled() -> bool {
    true
}
fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.md".to_string(),
        "**/*.markdown".to_string(),
        "**/*.txt".to_string(),
    ]
}
fn default_cache_ttl_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_ngram_size")]
    pub ngram_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            ngram_size: default_ngram_size(),
        }
    }
}

fn default_max_chars() -> usize {
    900
}
fn default_ngram_size() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f64,
    #[serde(default = "default_bm25_k1")]
    pub bm25_k1: f64,
    #[serde(default = "default_bm25_b")]
    pub bm25_b: f64,
    #[serde(default = "default_context_max_chars")]
    pub context_max_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: default_min_score(),
            candidate_multiplier: default_candidate_multiplier(),
            mmr_lambda: default_mmr_lambda(),
            bm25_k1: default_bm25_k1(),
            bm25_b: default_bm25_b(),
            context_max_chars: default_context_max_chars(),
        }
    }
}

fn default_top_k() -> usize {
    4
}
fn default_min_score() -> f64 {
    0.2
}
fn default_candidate_multiplier() -> usize {
    4
}
fn default_mmr_lambda() -> f64 {
    0.72
}
fn default_bm25_k1() -> f64 {
    1.2
}
fn default_bm25_b() -> f64 {
    0.75
}
fn default_context_max_chars() -> usize {
    6000
}

/// Clamp a float into `[lo, hi]`, mapping NaN to `fallback`.
fn clamp_f64(v: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if v.is_nan() {
        fallback
    } else {
        v.clamp(lo, hi)
    }
}

impl Config {
    /// All-defaults configuration rooted at `dir`.
    pub fn minimal(dir: impl Into<PathBuf>) -> Self {
        Self {
            knowledge: KnowledgeConfig {
                enabled: true,
                dir: dir.into(),
                include_globs: default_include_globs(),
                exclude_globs: Vec::new(),
                follow_symlinks: false,
                cache_ttl_secs: default_cache_ttl_secs(),
            },
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }

    /// Bring every numeric option into its supported range.
    pub fn clamped(mut self) -> Self {
        let c = &mut self.chunking;
        c.max_chars = c.max_chars.max(200);
        c.ngram_size = c.ngram_size.clamp(2, 5);

        let r = &mut self.retrieval;
        r.top_k = r.top_k.clamp(1, 50);
        r.min_score = clamp_f64(r.min_score, 0.0, f64::MAX, default_min_score());
        r.candidate_multiplier = r.candidate_multiplier.clamp(1, 20);
        r.mmr_lambda = clamp_f64(r.mmr_lambda, 0.0, 1.0, default_mmr_lambda());
        r.bm25_k1 = clamp_f64(r.bm25_k1, 0.1, 5.0, default_bm25_k1());
        r.bm25_b = clamp_f64(r.bm25_b, 0.0, 1.0, default_bm25_b());
        r.context_max_chars = r.context_max_chars.max(500);

        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.knowledge.cache_ttl_secs)
    }

    pub fn index_params(&self) -> IndexParams {
        IndexParams {
            max_chars: self.chunking.max_chars,
            ngram_size: self.chunking.ngram_size,
        }
    }

    pub fn retrieval_params(&self) -> RetrievalParams {
        RetrievalParams {
            top_k: self.retrieval.top_k,
            min_score: self.retrieval.min_score,
            candidate_multiplier: self.retrieval.candidate_multiplier,
            mmr_lambda: self.retrieval.mmr_lambda,
            bm25: Bm25Params {
                k1: self.retrieval.bm25_k1,
                b: self.retrieval.bm25_b,
            },
            ngram_size: self.chunking.ngram_size,
            context_max_chars: self.retrieval.context_max_chars,
        }
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.knowledge.dir.as_os_str().is_empty() {
        bail!("knowledge.dir must not be empty");
    }

    Ok(config.clamped())
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}
