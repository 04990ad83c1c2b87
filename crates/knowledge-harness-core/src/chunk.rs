//! Paragraph- and sentence-aware text chunker.
//!
//! Splits a document into spans of at most `max_chars` characters,
//! preferring to cut on blank lines, then on sentence terminators, and only
//! as a last resort in the middle of a sentence.
//!
//! # Algorithm
//!
//! 1. Split text into paragraphs on blank lines.
//! 2. Accumulate paragraphs (joined by `\n\n`) while the buffer stays within
//!    `max_chars`; otherwise flush the buffer and start a new one.
//! 3. A paragraph longer than `max_chars` on its own is split into sentences
//!    (Latin and CJK terminators) which are accumulated the same way.
//! 4. A sentence still longer than `max_chars` is hard-sliced into
//!    fixed-width windows.
//! 5. Whitespace-only pieces are dropped.
//!
//! Lengths are measured in characters, not bytes. The output is
//! deterministic, and re-chunking any produced chunk with the same
//! `max_chars` returns it unchanged.
//!
//! # Example
//!
//! ```rust
//! use knowledge_harness_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("Hello world.\n\nSecond paragraph.", 900);
//! assert_eq!(chunks, vec!["Hello world.\n\nSecond paragraph."]);
//! ```

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', ';', '。', '！', '？', '；', '…'];

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split text into chunk texts of at most `max_chars` characters each.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut buf = String::new();

    for para in paragraphs(text) {
        if char_len(&para) > max_chars {
            flush(&mut buf, &mut chunks);
            split_long_paragraph(&para, max_chars, &mut chunks);
            continue;
        }

        let would_be = if buf.is_empty() {
            char_len(&para)
        } else {
            char_len(&buf) + 2 + char_len(&para)
        };
        if would_be > max_chars {
            flush(&mut buf, &mut chunks);
        }
        if !buf.is_empty() {
            buf.push_str("\n\n");
        }
        buf.push_str(&para);
    }
    flush(&mut buf, &mut chunks);

    chunks
}

/// Blank-line separated paragraphs, trimmed, with empty ones removed.
fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            push_paragraph(&mut lines, &mut out);
        } else {
            lines.push(line);
        }
    }
    push_paragraph(&mut lines, &mut out);

    out
}

fn push_paragraph(lines: &mut Vec<&str>, out: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let para = lines.join("\n");
    let trimmed = para.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    lines.clear();
}

fn split_long_paragraph(para: &str, max_chars: usize, chunks: &mut Vec<String>) {
    let mut buf = String::new();

    for sentence in sentences(para) {
        if char_len(sentence.trim()) > max_chars {
            flush(&mut buf, chunks);
            hard_slice(sentence, max_chars, chunks);
            continue;
        }

        let mut candidate = buf.clone();
        candidate.push_str(sentence);
        if char_len(candidate.trim()) > max_chars {
            flush(&mut buf, chunks);
            buf.push_str(sentence);
        } else {
            buf = candidate;
        }
    }
    flush(&mut buf, chunks);
}

/// Sentences including their terminator and trailing whitespace, so that
/// concatenating them reproduces the paragraph.
///
/// ASCII terminators only end a sentence when followed by whitespace
/// (`3.14`, `e.g.x` stay intact); full-width terminators end it immediately.
fn sentences(para: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut terminated = false;
    let mut wide_terminator = false;
    let mut saw_space = false;

    for (i, c) in para.char_indices() {
        if SENTENCE_TERMINATORS.contains(&c) {
            terminated = true;
            wide_terminator = !c.is_ascii();
            saw_space = false;
        } else if c.is_whitespace() {
            saw_space = terminated;
        } else {
            if terminated && (wide_terminator || saw_space) {
                out.push(&para[start..i]);
                start = i;
            }
            terminated = false;
        }
    }
    if start < para.len() {
        out.push(&para[start..]);
    }
    out
}

fn hard_slice(sentence: &str, max_chars: usize, chunks: &mut Vec<String>) {
    let chars: Vec<char> = sentence.chars().collect();
    for window in chars.chunks(max_chars) {
        let piece: String = window.iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
    }
}

fn flush(buf: &mut String, chunks: &mut Vec<String>) {
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    buf.clear();
}
