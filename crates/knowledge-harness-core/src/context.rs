//! Prompt-context assembly.
//!
//! Renders ranked matches as numbered, source-attributed blocks for
//! injection into a language-model prompt.

use crate::models::Match;

/// Instruction lines placed before the snippet blocks.
pub const CONTEXT_PREAMBLE: &str = "Use the following knowledge base snippets to answer when they are relevant.\n\
Cite the sources you rely on by their path, for example: (Source: docs/policy.md).\n\
If the snippets do not contain the answer, say so instead of guessing.\n\n";

/// Render one snippet block.
pub fn render_block(index: usize, source: &str, text: &str) -> String {
    format!("[{}] Source: {}\n{}\n", index, source, text)
}

/// Build the context message from ranked matches.
///
/// Blocks are added in order while the running character total (blocks
/// plus separating newlines, preamble excluded) stays within `max_chars`;
/// the first block that would overflow ends the list. Returns `None` when
/// no block fits.
pub fn assemble_context(matches: &[Match], max_chars: usize) -> Option<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut total = 0;

    for (i, m) in matches.iter().enumerate() {
        let block = render_block(i + 1, &m.source, &m.text);
        let separator = usize::from(!blocks.is_empty());
        let len = block.chars().count() + separator;
        if total + len > max_chars {
            break;
        }
        total += len;
        blocks.push(block);
    }

    if blocks.is_empty() {
        return None;
    }
    Some(format!("{}{}", CONTEXT_PREAMBLE, blocks.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreMetrics;

    fn m(source: &str, text: &str) -> Match {
        Match {
            source: source.to_string(),
            chunk_id: format!("{}#0", source),
            hash: String::new(),
            text: text.to_string(),
            score: 1.0,
            metrics: ScoreMetrics::default(),
        }
    }

    #[test]
    fn test_empty_matches_is_none() {
        assert!(assemble_context(&[], 1000).is_none());
    }

    #[test]
    fn test_blocks_are_numbered_with_sources() {
        let ctx = assemble_context(&[m("a.md", "first"), m("b.md", "second")], 1000).unwrap();
        assert!(ctx.starts_with(CONTEXT_PREAMBLE));
        assert!(ctx.contains("[1] Source: a.md\nfirst\n"));
        assert!(ctx.contains("[2] Source: b.md\nsecond\n"));
    }

    #[test]
    fn test_budget_stops_at_first_overflow() {
        let first = render_block(1, "a.md", "short");
        let budget = first.chars().count() + 5;
        let ctx = assemble_context(
            &[m("a.md", "short"), m("b.md", &"x".repeat(50)), m("c.md", "y")],
            budget,
        )
        .unwrap();
        assert!(ctx.contains("a.md"));
        assert!(!ctx.contains("b.md"));
        assert!(!ctx.contains("c.md"));
    }

    #[test]
    fn test_nothing_fits_is_none() {
        assert!(assemble_context(&[m("a.md", &"x".repeat(100))], 50).is_none());
    }

    #[test]
    fn test_length_bounded_by_budget_plus_preamble() {
        let matches: Vec<Match> = (0..20)
            .map(|i| m(&format!("doc{}.md", i), &"word ".repeat(i * 7)))
            .collect();
        for budget in [60, 200, 500, 2000] {
            if let Some(ctx) = assemble_context(&matches, budget) {
                assert!(ctx.chars().count() <= budget + CONTEXT_PREAMBLE.chars().count());
            }
        }
    }
}
