//! Index snapshot construction.
//!
//! Turns a corpus of [`Document`]s into an [`IndexSnapshot`]: chunk records
//! with their lexical features plus the corpus-wide statistics BM25 needs
//! (per-token document frequency and mean chunk length).

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::chunk::chunk_text;
use crate::models::{Chunk, Document, IndexSnapshot};
use crate::tokenize::{build_char_ngrams, normalize_whitespace, tokenize};

/// Parameters controlling how documents are cut and featurized.
#[derive(Debug, Clone, Copy)]
pub struct IndexParams {
    /// Maximum chunk length in characters.
    pub max_chars: usize,
    /// Character n-gram length used for fuzzy matching.
    pub ngram_size: usize,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            max_chars: 900,
            ngram_size: 3,
        }
    }
}

/// Build a chunk record, or `None` when the text yields no tokens.
pub fn make_chunk(source_path: &str, ordinal: usize, text: &str, ngram_size: usize) -> Option<Chunk> {
    let normalized_text = normalize_whitespace(text);
    let tokens = tokenize(&normalized_text);
    if tokens.is_empty() {
        return None;
    }

    let token_count = tokens.len();
    let mut token_frequency: HashMap<String, u32> = HashMap::new();
    for token in tokens {
        *token_frequency.entry(token).or_insert(0) += 1;
    }
    let token_set: HashSet<String> = token_frequency.keys().cloned().collect();

    let mut hasher = Sha256::new();
    hasher.update(normalized_text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Some(Chunk {
        id: format!("{}#{}", source_path, ordinal),
        source_path: source_path.to_string(),
        ordinal,
        search_text: normalized_text.to_lowercase(),
        ngram_set: build_char_ngrams(&normalized_text, ngram_size),
        normalized_text,
        token_frequency,
        token_set,
        token_count,
        hash,
    })
}

/// Chunk a single document, dropping token-less spans.
///
/// Ordinals are contiguous over the kept chunks.
pub fn chunk_document(doc: &Document, params: &IndexParams) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for text in chunk_text(&doc.text, params.max_chars) {
        if let Some(chunk) = make_chunk(&doc.path, chunks.len(), &text, params.ngram_size) {
            chunks.push(chunk);
        }
    }
    chunks
}

/// Build a complete snapshot from a corpus.
pub fn build_snapshot(documents: &[Document], params: &IndexParams) -> IndexSnapshot {
    let chunks: Vec<Chunk> = documents
        .iter()
        .flat_map(|doc| chunk_document(doc, params))
        .collect();

    let mut document_frequency: HashMap<String, usize> = HashMap::new();
    for chunk in &chunks {
        for token in &chunk.token_set {
            *document_frequency.entry(token.clone()).or_insert(0) += 1;
        }
    }

    let total_tokens: usize = chunks.iter().map(|c| c.token_count).sum();
    let average_chunk_tokens = if chunks.is_empty() {
        0.0
    } else {
        total_tokens as f64 / chunks.len() as f64
    };

    IndexSnapshot {
        chunks,
        document_frequency,
        average_chunk_tokens,
        file_count: documents.len(),
        built_at: Utc::now(),
        last_error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> IndexParams {
        IndexParams {
            max_chars: 200,
            ngram_size: 3,
        }
    }

    #[test]
    fn test_make_chunk_features() {
        let chunk = make_chunk("a.md", 2, "Leave   leave\npolicy", 3).unwrap();
        assert_eq!(chunk.id, "a.md#2");
        assert_eq!(chunk.normalized_text, "Leave leave policy");
        assert_eq!(chunk.search_text, "leave leave policy");
        assert_eq!(chunk.token_count, 3);
        assert_eq!(chunk.token_frequency["leave"], 2);
        assert_eq!(chunk.token_set.len(), 2);
        assert!(chunk.ngram_set.contains("lea"));
        assert_eq!(chunk.hash.len(), 64);
    }

    #[test]
    fn test_tokenless_chunk_rejected() {
        assert!(make_chunk("a.md", 0, "- * ! a", 3).is_none());
    }

    #[test]
    fn test_tokenless_paragraphs_dropped_and_ordinals_contiguous() {
        let doc = Document::new(
            "notes.md",
            format!("---\n\n{}\n\n{}", "alpha ".repeat(33), "beta ".repeat(39)),
        );
        let chunks = chunk_document(&doc, &params());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].ordinal, 0);
        assert_eq!(chunks[1].ordinal, 1);
        assert_eq!(chunks[1].id, "notes.md#1");
    }

    #[test]
    fn test_snapshot_statistics() {
        let docs = vec![
            Document::new("a.md", "apple banana"),
            Document::new("b.md", "apple cherry cherry"),
            Document::new("empty.md", ""),
        ];
        let snap = build_snapshot(&docs, &params());
        assert_eq!(snap.file_count, 3);
        assert_eq!(snap.chunk_count(), 2);
        assert_eq!(snap.document_frequency("apple"), 2);
        assert_eq!(snap.document_frequency("cherry"), 1);
        assert_eq!(snap.document_frequency("durian"), 0);
        assert!((snap.average_chunk_tokens - 2.5).abs() < 1e-9);
        assert!(snap.last_error.is_none());
    }

    #[test]
    fn test_no_chunk_without_tokens() {
        let docs = vec![
            Document::new("a.md", "!!!\n\n???\n\nreal words here"),
            Document::new("b.md", "   \n\n   "),
        ];
        let snap = build_snapshot(&docs, &params());
        assert!(snap.chunks.iter().all(|c| c.token_count > 0));
    }

    #[test]
    fn test_empty_corpus() {
        let snap = build_snapshot(&[], &params());
        assert!(snap.is_empty());
        assert_eq!(snap.average_chunk_tokens, 0.0);
    }
}
