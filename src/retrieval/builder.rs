//! Builds and caches per-transcript vector indices.

use super::cache::{CacheStats, IndexCache};
use super::{content_key, Retriever};
use crate::chunking::Chunker;
use crate::config::IndexSettings;
use crate::embedding::Embedder;
use crate::error::{Result, VidqaError};
use crate::flight::SingleFlight;
use crate::vector_store::{Document, MemoryVectorStore};
use futures::FutureExt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

type BuildResult = std::result::Result<Arc<MemoryVectorStore>, Arc<VidqaError>>;

/// Turns transcript text into a [`Retriever`], reusing cached indices.
pub struct IndexBuilder {
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    cache: Arc<IndexCache>,
    flights: SingleFlight<String, BuildResult>,
    top_k: usize,
    min_score: f32,
}

impl IndexBuilder {
    pub fn new(chunker: Arc<dyn Chunker>, embedder: Arc<dyn Embedder>, settings: &IndexSettings) -> Self {
        Self {
            chunker,
            embedder,
            cache: Arc::new(IndexCache::new(settings.max_entries, settings.ttl())),
            flights: SingleFlight::new(),
            top_k: settings.top_k,
            min_score: settings.min_score,
        }
    }

    /// Get a retriever for the transcript, building its index on a cache miss.
    ///
    /// Concurrent calls for identical text share one build. A failed build
    /// caches nothing.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn retriever(&self, text: &str) -> Result<Retriever> {
        if text.trim().is_empty() {
            return Err(VidqaError::InvalidInput("Transcript text is empty".to_string()));
        }

        let key = content_key(text);
        let store = match self.cache.get(&key) {
            Some(store) => {
                debug!("Index cache hit for {}", &key[..12]);
                store
            }
            None => {
                let chunker = self.chunker.clone();
                let embedder = self.embedder.clone();
                let cache = self.cache.clone();
                let text = text.to_string();
                let build_key = key.clone();

                self.flights
                    .run(key, move || {
                        async move {
                            build_index(&*chunker, &*embedder, &cache, build_key, &text)
                                .await
                                .map_err(Arc::new)
                        }
                        .boxed()
                    })
                    .await
                    .map_err(VidqaError::Shared)?
            }
        };

        Ok(Retriever::new(store, self.embedder.clone(), self.top_k, self.min_score))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of index builds currently running.
    pub fn builds_in_flight(&self) -> usize {
        self.flights.in_flight()
    }
}

async fn build_index(
    chunker: &dyn Chunker,
    embedder: &dyn Embedder,
    cache: &IndexCache,
    key: String,
    text: &str,
) -> Result<Arc<MemoryVectorStore>> {
    // Queued behind a build that has since finished.
    if let Some(store) = cache.get(&key) {
        return Ok(store);
    }

    let chunks = chunker.chunk(text);
    if chunks.is_empty() {
        return Err(VidqaError::InvalidInput(
            "Transcript produced no chunks".to_string(),
        ));
    }

    let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_batch(&contents).await?;
    if embeddings.len() != chunks.len() {
        return Err(VidqaError::Embedding(format!(
            "Expected {} embeddings, got {}",
            chunks.len(),
            embeddings.len()
        )));
    }

    let documents: Vec<Document> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| Document::new(chunk.content, chunk.order, embedding))
        .collect();

    info!("Built index of {} chunks for {}", documents.len(), &key[..12]);
    let store = Arc::new(MemoryVectorStore::from_documents(documents));
    cache.insert(key, store.clone());
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::RecursiveChunker;
    use crate::retrieval::testing::LetterEmbedder;
    use std::time::Duration;

    fn settings() -> IndexSettings {
        IndexSettings {
            max_entries: 4,
            ttl_seconds: 0,
            top_k: 2,
            min_score: -1.0,
        }
    }

    fn builder(embedder: Arc<LetterEmbedder>) -> IndexBuilder {
        let chunker = Arc::new(RecursiveChunker::new(20, 5).unwrap());
        IndexBuilder::new(chunker, embedder, &settings())
    }

    const TEXT: &str = "apples are red and crunchy. bananas are yellow. cherries are small.";

    #[tokio::test]
    async fn test_builds_then_reuses_index() {
        let embedder = Arc::new(LetterEmbedder::new());
        let builder = builder(embedder.clone());

        let retriever = builder.retriever(TEXT).await.unwrap();
        assert!(retriever.chunk_count() > 1);
        assert_eq!(retriever.k(), 2);

        builder.retriever(TEXT).await.unwrap();
        assert_eq!(embedder.batch_calls(), 1);

        let stats = builder.cache_stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_retrieves_relevant_chunk() {
        let builder = builder(Arc::new(LetterEmbedder::new()));
        let retriever = builder.retriever(TEXT).await.unwrap();

        let results = retriever.retrieve("bananas yellow").await.unwrap();
        assert!(results[0].document.content.contains("yellow"));
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let builder = builder(Arc::new(LetterEmbedder::new()));
        assert!(matches!(
            builder.retriever("   \n ").await,
            Err(VidqaError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_embedding_mismatch_not_cached() {
        let embedder = Arc::new(LetterEmbedder {
            short: true,
            ..LetterEmbedder::new()
        });
        let builder = builder(embedder.clone());

        let err = builder.retriever(TEXT).await.err().unwrap();
        assert!(matches!(err.root(), VidqaError::Embedding(_)));
        assert_eq!(builder.cache_stats().entries, 0);

        builder.retriever(TEXT).await.err().unwrap();
        assert_eq!(embedder.batch_calls(), 2);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let builder = builder(Arc::new(LetterEmbedder::new()));
        let err = builder.retriever("this will EXPLODE").await.err().unwrap();
        assert!(matches!(err.root(), VidqaError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_concurrent_builds_share_work() {
        let embedder = Arc::new(LetterEmbedder {
            delay: Duration::from_millis(50),
            ..LetterEmbedder::new()
        });
        let builder = Arc::new(builder(embedder.clone()));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let builder = builder.clone();
                tokio::spawn(async move { builder.retriever(TEXT).await.map(|r| r.chunk_count()) })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap() > 1);
        }
        assert_eq!(embedder.batch_calls(), 1);
        assert_eq!(builder.builds_in_flight(), 0);
    }
}
