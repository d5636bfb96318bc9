//! Context assembly for the answer prompt.

use super::ContextChunk;
use crate::vector_store::SearchResult;

/// Separator between excerpts in the prompt.
const EXCERPT_SEPARATOR: &str = "\n\n";

/// Select excerpts, best first, until the next one would push the context
/// past `max_chars`. The best excerpt is always kept.
pub fn select_context(results: Vec<SearchResult>, max_chars: usize) -> Vec<ContextChunk> {
    let mut selected: Vec<ContextChunk> = Vec::with_capacity(results.len());
    let mut used = 0usize;

    for result in results {
        let len = result.document.content.chars().count();
        let extra = if selected.is_empty() {
            len
        } else {
            len + EXCERPT_SEPARATOR.len()
        };

        if !selected.is_empty() && used + extra > max_chars {
            break;
        }
        used += extra;
        selected.push(ContextChunk::from(result));
    }

    selected
}

/// Join excerpt texts in rank order for the prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join(EXCERPT_SEPARATOR)
}
