//! # Knowledge Harness Core
//!
//! Pure retrieval logic for Knowledge Harness: tokenization, chunking,
//! index snapshots, hybrid lexical scoring, MMR diversification, and
//! prompt-context assembly.
//!
//! This crate performs no filesystem I/O and holds no global state. The
//! calling application is responsible for loading documents, caching
//! snapshots, and mapping its configuration onto [`index::IndexParams`]
//! and [`search::RetrievalParams`].
//!
//! ```text
//! Documents ──▶ chunk ──▶ tokenize ──▶ index::build_snapshot ──▶ IndexSnapshot
//!                                                                   │
//! query ──▶ tokenize::QueryFeatures ──▶ score ──▶ mmr ──▶ context ◀─┘
//! ```

pub mod chunk;
pub mod context;
pub mod index;
pub mod mmr;
pub mod models;
pub mod score;
pub mod search;
pub mod tokenize;
