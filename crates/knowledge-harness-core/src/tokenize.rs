//! Tokenizer and lexical feature extraction.
//!
//! Shared by indexing and querying so both sides see identical features.
//!
//! # Token stream
//!
//! Text is lower-cased and scanned once:
//!
//! - Runs of ASCII word characters (`[a-z0-9_]`) of length ≥ 2 become one
//!   token each. Other scripts only contribute through CJK tokens and the
//!   character n-grams.
//! - Every CJK ideograph becomes a single-character token.
//! - A CJK run of length ≥ 2 additionally contributes the whole run (when it
//!   is at most 8 characters long) and every overlapping bigram.
//!
//! Languages written without spaces therefore match at character, bigram,
//! and word granularity at the same time.

use std::collections::HashSet;

/// Longest CJK run kept as a whole-run token.
const MAX_CJK_RUN_TOKEN: usize = 8;

/// Latin tokens at least this long are considered specific terms.
const LONG_LATIN_TOKEN: usize = 6;

/// Maximum number of phrases extracted from a query.
pub const MAX_QUERY_PHRASES: usize = 10;

/// Minimum length (chars) of any query phrase.
pub const MIN_PHRASE_CHARS: usize = 3;

/// Minimum length of a Latin word to count as a query phrase.
const MIN_PHRASE_WORD_CHARS: usize = 5;

/// Returns true for CJK ideographs (unified, extension A–F, compatibility).
pub fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xF900..=0xFAFF
        | 0x20000..=0x2FA1F)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Collapse all whitespace runs to single spaces and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into a multi-granularity token sequence.
///
/// Tokens are emitted in scan order; repeated terms appear repeatedly, so
/// the output can be counted into term frequencies.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut cjk: Vec<char> = Vec::new();

    for c in lowered.chars() {
        if is_cjk(c) {
            flush_word(&mut word, &mut tokens);
            cjk.push(c);
        } else if is_word_char(c) {
            flush_cjk(&mut cjk, &mut tokens);
            word.push(c);
        } else {
            flush_word(&mut word, &mut tokens);
            flush_cjk(&mut cjk, &mut tokens);
        }
    }
    flush_word(&mut word, &mut tokens);
    flush_cjk(&mut cjk, &mut tokens);

    tokens
}

fn flush_word(word: &mut String, tokens: &mut Vec<String>) {
    if word.chars().count() >= 2 {
        tokens.push(std::mem::take(word));
    } else {
        word.clear();
    }
}

fn flush_cjk(run: &mut Vec<char>, tokens: &mut Vec<String>) {
    if run.is_empty() {
        return;
    }
    tokens.extend(run.iter().map(|c| c.to_string()));
    if run.len() >= 2 {
        if run.len() <= MAX_CJK_RUN_TOKEN {
            tokens.push(run.iter().collect());
        }
        tokens.extend(run.windows(2).map(|pair| pair.iter().collect::<String>()));
    }
    run.clear();
}

/// Scoring weight of a token.
///
/// Multi-character CJK terms and long Latin words are less ambiguous than
/// single ideographs or short words, so they count for more.
pub fn token_weight(token: &str) -> f64 {
    let len = token.chars().count();
    let all_cjk = len > 0 && token.chars().all(is_cjk);
    if all_cjk && len >= 2 {
        1.35
    } else if all_cjk {
        0.8
    } else if len >= LONG_LATIN_TOKEN {
        1.25
    } else {
        1.0
    }
}

/// Character n-grams over the lower-cased, whitespace-stripped text.
///
/// Text shorter than `n` yields itself as the only gram; empty text yields
/// an empty set.
pub fn build_char_ngrams(text: &str, n: usize) -> HashSet<String> {
    let chars: Vec<char> = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if chars.is_empty() {
        return HashSet::new();
    }
    let n = n.max(1);
    if chars.len() < n {
        return HashSet::from([chars.iter().collect()]);
    }
    chars.windows(n).map(|w| w.iter().collect()).collect()
}

/// Features derived from one query, valid for a single retrieval call.
#[derive(Debug, Clone)]
pub struct QueryFeatures {
    /// Lower-cased, whitespace-collapsed query.
    pub normalized_text: String,
    /// Distinct tokens in first-occurrence order.
    pub unique_tokens: Vec<String>,
    pub ngram_set: HashSet<String>,
    /// Candidate substrings for phrase matching, at most [`MAX_QUERY_PHRASES`].
    pub phrases: Vec<String>,
}

impl QueryFeatures {
    pub fn new(query: &str, ngram_size: usize) -> Self {
        let normalized_text = normalize_whitespace(query).to_lowercase();

        let mut seen = HashSet::new();
        let unique_tokens = tokenize(&normalized_text)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();

        Self {
            ngram_set: build_char_ngrams(&normalized_text, ngram_size),
            phrases: extract_phrases(&normalized_text),
            unique_tokens,
            normalized_text,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.unique_tokens.is_empty()
    }
}

/// Phrase candidates: the whole query, long non-Latin runs, and long Latin
/// words, deduplicated and capped.
fn extract_phrases(normalized: &str) -> Vec<String> {
    let mut phrases: Vec<String> = Vec::new();
    let mut push = |p: String| {
        if p.chars().count() >= MIN_PHRASE_CHARS
            && phrases.len() < MAX_QUERY_PHRASES
            && !phrases.contains(&p)
        {
            phrases.push(p);
        }
    };

    push(normalized.to_string());

    for run in runs(normalized, |c| c.is_alphanumeric() && !c.is_ascii()) {
        push(run);
    }
    for word in runs(normalized, is_word_char) {
        if word.chars().count() >= MIN_PHRASE_WORD_CHARS {
            push(word);
        }
    }

    phrases
}

fn runs(text: &str, belongs: impl Fn(char) -> bool) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if belongs(c) {
            current.push(c);
        } else if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_tokens_lowercased_min_two_chars() {
        let tokens = tokenize("Hello, a World_42 x!");
        assert_eq!(tokens, vec!["hello", "world_42"]);
    }

    #[test]
    fn test_non_ascii_letters_break_words() {
        let tokens = tokenize("naïve café привет ひらがな");
        assert_eq!(tokens, vec!["na", "ve", "caf"]);
        assert!((token_weight("ab_123") - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_cjk_run_multi_granularity() {
        let tokens = tokenize("年假政策");
        for expected in ["年", "假", "政", "策", "年假政策", "年假", "假政", "政策"] {
            assert!(tokens.contains(&expected.to_string()), "missing {}", expected);
        }
        assert_eq!(tokens.len(), 4 + 1 + 3);
    }

    #[test]
    fn test_long_cjk_run_not_kept_whole() {
        let text = "一二三四五六七八九";
        let tokens = tokenize(text);
        assert!(!tokens.contains(&text.to_string()));
        assert!(tokens.contains(&"八九".to_string()));
    }

    #[test]
    fn test_mixed_script_boundaries() {
        let tokens = tokenize("API文档v2");
        assert!(tokens.contains(&"api".to_string()));
        assert!(tokens.contains(&"文档".to_string()));
        assert!(tokens.contains(&"v2".to_string()));
    }

    #[test]
    fn test_token_weights() {
        assert!((token_weight("政策") - 1.35).abs() < 1e-9);
        assert!((token_weight("政") - 0.8).abs() < 1e-9);
        assert!((token_weight("vacation") - 1.25).abs() < 1e-9);
        assert!((token_weight("weeks") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_char_ngrams() {
        let grams = build_char_ngrams("Ab c", 3);
        assert_eq!(grams, HashSet::from(["abc".to_string()]));

        let short = build_char_ngrams("ab", 3);
        assert_eq!(short, HashSet::from(["ab".to_string()]));

        assert!(build_char_ngrams("   ", 3).is_empty());
    }

    #[test]
    fn test_query_features_phrases() {
        let q = QueryFeatures::new("  How many WEEKS notice for vacation ", 3);
        assert_eq!(q.normalized_text, "how many weeks notice for vacation");
        assert_eq!(q.phrases[0], "how many weeks notice for vacation");
        assert!(q.phrases.contains(&"notice".to_string()));
        assert!(q.phrases.contains(&"vacation".to_string()));
        assert!(!q.phrases.contains(&"many".to_string()));
    }

    #[test]
    fn test_non_latin_phrase_runs_need_three_chars() {
        let q = QueryFeatures::new("年假 申请流程 привет", 3);
        assert!(!q.phrases.contains(&"年假".to_string()));
        assert!(q.phrases.contains(&"申请流程".to_string()));
        assert!(q.phrases.contains(&"привет".to_string()));
    }

    #[test]
    fn test_query_phrases_capped_and_deduped() {
        let q = QueryFeatures::new(
            "alpha1 alpha1 bravo2 charlie delta4 echo55 foxtrot golf77 hotel8 india9 juliet kilo00 limas",
            3,
        );
        assert_eq!(q.phrases.len(), MAX_QUERY_PHRASES);
        let alpha = q.phrases.iter().filter(|p| p.as_str() == "alpha1").count();
        assert_eq!(alpha, 1);
    }

    #[test]
    fn test_query_unique_tokens_dedup() {
        let q = QueryFeatures::new("leave leave policy", 3);
        assert_eq!(q.unique_tokens, vec!["leave", "policy"]);
    }

    #[test]
    fn test_whitespace_query_is_empty() {
        let q = QueryFeatures::new(" \n\t ", 3);
        assert!(q.is_empty());
        assert!(q.phrases.is_empty());
        assert!(q.ngram_set.is_empty());
    }
}
