//! # Knowledge Harness
//!
//! A local-first hybrid lexical retriever for chat pipelines.
//!
//! Knowledge Harness indexes a directory of plain-text and markdown files
//! into bounded chunks and, for each query, ranks them with BM25, phrase
//! matching, character n-gram similarity, and query-term coverage, then
//! diversifies the top results with Maximal Marginal Relevance. The
//! selected snippets come back with citations and a ready-to-inject prompt
//! context.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌───────────────┐
//! │ Document     │──▶│ KnowledgeCache   │──▶│ IndexSnapshot │
//! │ source (FS)  │   │ TTL + swap       │   │ (immutable)   │
//! └──────────────┘   └──────────────────┘   └───────┬───────┘
//!                                                   │
//!        query ──▶ Retriever ──▶ score ──▶ MMR ──▶ context
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and clamping |
//! | [`source`] | Document sources (filesystem) |
//! | [`cache`] | Snapshot cache with TTL rebuilds |
//! | [`retriever`] | `retrieve` / `status` API |
//! | [`logging`] | Tracing subscriber setup |
//!
//! The pure algorithms (tokenizer, chunker, scorer, MMR, context assembly)
//! live in the `knowledge-harness-core` crate.

pub mod cache;
pub mod config;
pub mod logging;
pub mod retriever;
pub mod source;
