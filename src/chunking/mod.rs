//! Text chunking strategies for breaking transcripts into searchable pieces.
//!
//! Transcripts are plain text without timing, so chunks are bounded by
//! character count, with overlap between neighbours so a sentence cut at a
//! boundary still appears whole in one of them.

mod fixed;
mod recursive;

pub use fixed::FixedWindowChunker;
pub use recursive::RecursiveChunker;

use crate::config::ChunkingSettings;
use crate::error::{Result, VidqaError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A chunk of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Position of this chunk in the transcript.
    pub order: usize,
}

impl TextChunk {
    pub fn new(content: String, order: usize) -> Self {
        Self { content, order }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// Split on paragraph, line, then word boundaries.
    Recursive,
    /// Fixed character windows.
    Fixed,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recursive" => Ok(ChunkingStrategy::Recursive),
            "fixed" => Ok(ChunkingStrategy::Fixed),
            _ => Err(format!("Unknown chunking strategy: {}", s)),
        }
    }
}

/// Trait for text chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split text into ordered chunks. Blank input yields no chunks.
    fn chunk(&self, text: &str) -> Vec<TextChunk>;
}

/// Check size/overlap before building a chunker.
pub(crate) fn validate(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(VidqaError::InvalidInput(
            "chunk_size must be greater than zero".to_string(),
        ));
    }
    if chunk_overlap >= chunk_size {
        return Err(VidqaError::InvalidInput(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            chunk_overlap, chunk_size
        )));
    }
    Ok(())
}

/// Create a chunker from settings.
pub fn create_chunker(settings: &ChunkingSettings) -> Result<Arc<dyn Chunker>> {
    let strategy: ChunkingStrategy = settings
        .strategy
        .parse()
        .map_err(VidqaError::Config)?;

    Ok(match strategy {
        ChunkingStrategy::Recursive => Arc::new(RecursiveChunker::new(
            settings.chunk_size,
            settings.chunk_overlap,
        )?),
        ChunkingStrategy::Fixed => Arc::new(FixedWindowChunker::new(
            settings.chunk_size,
            settings.chunk_overlap,
        )?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("recursive".parse::<ChunkingStrategy>().unwrap(), ChunkingStrategy::Recursive);
        assert_eq!("FIXED".parse::<ChunkingStrategy>().unwrap(), ChunkingStrategy::Fixed);
        assert!("semantic".parse::<ChunkingStrategy>().is_err());
    }

    #[test]
    fn test_create_chunker_rejects_bad_config() {
        let mut settings = ChunkingSettings::default();
        settings.chunk_overlap = settings.chunk_size;
        assert!(matches!(create_chunker(&settings), Err(VidqaError::InvalidInput(_))));

        let settings = ChunkingSettings {
            strategy: "bogus".to_string(),
            ..Default::default()
        };
        assert!(matches!(create_chunker(&settings), Err(VidqaError::Config(_))));
    }

    #[test]
    fn test_create_default_chunker() {
        let chunker = create_chunker(&ChunkingSettings::default()).unwrap();
        let chunks = chunker.chunk("a short transcript");
        assert_eq!(chunks, vec![TextChunk::new("a short transcript".to_string(), 0)]);
    }
}
