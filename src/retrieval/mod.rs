//! Retrieval indices over transcript text.
//!
//! A transcript is chunked, embedded and loaded into an in-memory vector
//! store. Built stores are cached under the SHA-256 of the transcript, so a
//! transcript seen before (from any video) is never re-embedded while its
//! index is still cached.

mod builder;
mod cache;

pub use builder::IndexBuilder;
pub use cache::{CacheStats, IndexCache};

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{MemoryVectorStore, SearchResult, VectorStore};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Cache key for a transcript: lowercase hex SHA-256 of its UTF-8 bytes.
pub fn content_key(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Top-k similarity search over one transcript's index.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<MemoryVectorStore>,
    embedder: Arc<dyn Embedder>,
    k: usize,
    min_score: f32,
}

impl Retriever {
    pub fn new(store: Arc<MemoryVectorStore>, embedder: Arc<dyn Embedder>, k: usize, min_score: f32) -> Self {
        Self {
            store,
            embedder,
            k,
            min_score,
        }
    }

    /// Same index, different number of results.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of chunks in the index.
    pub fn chunk_count(&self) -> usize {
        self.store.len()
    }

    /// Embed the query and return the most similar chunks, best first.
    #[instrument(skip(self, query), fields(k = self.k))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        if self.k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let results = self
            .store
            .search_with_threshold(&query_embedding, self.k, self.min_score)
            .await?;

        debug!("Retrieved {} of {} chunks", results.len(), self.store.len());
        Ok(results)
    }
}
