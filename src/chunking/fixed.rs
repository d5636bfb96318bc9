//! Fixed-size character windows.

use super::{validate, Chunker, TextChunk};
use crate::error::Result;

/// Cuts text into windows of `chunk_size` characters, each starting
/// `chunk_size - chunk_overlap` characters after the previous one.
#[derive(Debug, Clone)]
pub struct FixedWindowChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedWindowChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate(chunk_size, chunk_overlap)?;
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

impl Chunker for FixedWindowChunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            let trimmed = window.trim();
            if !trimmed.is_empty() {
                chunks.push(TextChunk::new(trimmed.to_string(), chunks.len()));
            }
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_overlap() {
        let chunker = FixedWindowChunker::new(4, 1).unwrap();
        let chunks = chunker.chunk("abcdefghij");
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_blank_windows_are_dropped() {
        let chunker = FixedWindowChunker::new(3, 0).unwrap();
        let chunks = chunker.chunk("ab    cd");
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["ab", "cd"]);
        assert_eq!(chunks[1].order, 1);
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(FixedWindowChunker::new(10, 10).is_err());
        assert!(FixedWindowChunker::new(0, 0).is_err());
    }
}
