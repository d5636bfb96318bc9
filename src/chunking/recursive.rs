//! Recursive character splitting.

use super::{validate, Chunker, TextChunk};
use crate::error::Result;
use std::collections::VecDeque;

const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Splits on the coarsest separator present in the text, merges the pieces
/// back up to `chunk_size` characters with `chunk_overlap` characters of
/// carry-over, and recurses with finer separators on pieces that are still
/// too long.
///
/// Separators are kept at the start of the piece that follows them, so
/// joining adjacent pieces reproduces the original text.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        Self::with_separators(
            chunk_size,
            chunk_overlap,
            DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn with_separators(
        chunk_size: usize,
        chunk_overlap: usize,
        separators: Vec<String>,
    ) -> Result<Self> {
        validate(chunk_size, chunk_overlap)?;
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators,
        })
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut output = Vec::new();

        // Coarsest separator that actually occurs; "" splits into characters.
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut small: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                output.extend(self.merge(std::mem::take(&mut small)));
            }
            if finer.is_empty() {
                output.push(piece);
            } else {
                output.extend(self.split_recursive(&piece, finer));
            }
        }

        if !small.is_empty() {
            output.extend(self.merge(small));
        }

        output
    }

    /// Greedily pack pieces into chunks, keeping a tail of at most
    /// `chunk_overlap` characters as the start of the next chunk.
    fn merge(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(String, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(&piece);

            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut chunks, &window);

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }

            total += len;
            window.push_back((piece, len));
        }

        push_trimmed(&mut chunks, &window);
        chunks
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        self.split_recursive(text, &self.separators)
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .enumerate()
            .map(|(order, content)| TextChunk::new(content, order))
            .collect()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn push_trimmed(chunks: &mut Vec<String>, window: &VecDeque<(String, usize)>) {
    let joined: String = window.iter().map(|(s, _)| s.as_str()).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut parts = text.split(separator);
    let mut pieces = Vec::new();
    if let Some(first) = parts.next() {
        if !first.is_empty() {
            pieces.push(first.to_string());
        }
    }
    pieces.extend(parts.map(|part| format!("{}{}", separator, part)));
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("word{:04}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = RecursiveChunker::new(800, 100).unwrap();
        let chunks = chunker.chunk("  just a few words  ");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "just a few words");
        assert_eq!(chunks[0].order, 0);
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        let chunker = RecursiveChunker::new(800, 100).unwrap();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk(" \n\n  ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let chunker = RecursiveChunker::new(100, 30).unwrap();
        let text = words(200);
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 10);
        for chunk in &chunks {
            assert!(chunk.len() <= 100, "chunk too long: {}", chunk.len());
        }

        // Neighbours share at least one whole word.
        for pair in chunks.windows(2) {
            let last_word = pair[0].content.split(' ').last().unwrap();
            assert!(
                pair[1].content.contains(last_word),
                "no overlap between {:?} and {:?}",
                pair[0].content,
                pair[1].content
            );
        }

        // Every word survives chunking.
        for i in [0, 57, 199] {
            let word = format!("word{:04}", i);
            assert!(chunks.iter().any(|c| c.content.contains(&word)));
        }

        let orders: Vec<usize> = chunks.iter().map(|c| c.order).collect();
        assert_eq!(orders, (0..chunks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let chunker = RecursiveChunker::new(60, 0).unwrap();
        let text = "First paragraph is here.\n\nSecond paragraph follows.\n\nThird one closes it out nicely.";
        let chunks = chunker.chunk(text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].content,
            "First paragraph is here.\n\nSecond paragraph follows."
        );
        assert_eq!(chunks[1].content, "Third one closes it out nicely.");
    }

    #[test]
    fn test_unbroken_text_splits_by_character() {
        let chunker = RecursiveChunker::new(10, 2).unwrap();
        let text = "a".repeat(25);
        let chunks = chunker.chunk(&text);

        assert!(chunks.iter().all(|c| c.len() <= 10));
        assert_eq!(chunks[0].content, "a".repeat(10));
        assert!(chunks.len() >= 3);
    }

    #[test]
    fn test_multibyte_lengths_counted_in_chars() {
        let chunker = RecursiveChunker::new(6, 0).unwrap();
        let chunks = chunker.chunk("ééééé ééééé");
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 5));
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(
            split_keeping_separator("a b  c", " "),
            vec!["a", " b", " ", " c"]
        );
        assert_eq!(split_keeping_separator(" lead", " "), vec![" lead"]);
        assert_eq!(split_keeping_separator("ab", ""), vec!["a", "b"]);
    }
}
