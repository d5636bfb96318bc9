//! Question answering over a video's transcript.
//!
//! Ties the pipeline together: `video input -> video id -> transcript ->
//! retriever -> answer`.

use crate::chunking::create_chunker;
use crate::config::{Prompts, Settings};
use crate::embedding::create_embedder;
use crate::error::{Result, VidqaError};
use crate::rag::{Answer, ContextChunk, OpenAIChatModel, RagEngine};
use crate::retrieval::{CacheStats, IndexBuilder};
use crate::transcript::{create_fetcher, FetchedTranscript, ProviderStatus, TranscriptFetcher};
use crate::video::parse_video_id;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Answer to a question about a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResult {
    pub video_id: String,
    /// Transcript provider that supplied the captions.
    pub provider: String,
    pub answer: String,
    /// Excerpts the answer was generated from, best first.
    pub context: Vec<ContextChunk>,
}

/// Chunks most similar to a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub video_id: String,
    pub provider: String,
    pub results: Vec<ContextChunk>,
}

/// Cache and provider health, for `/health` and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub index_cache: CacheStats,
    pub transcripts_cached: usize,
    pub index_builds_in_flight: usize,
    pub providers: Vec<ProviderStatus>,
}

/// The question answering service.
pub struct QaService {
    fetcher: TranscriptFetcher,
    indexer: IndexBuilder,
    engine: RagEngine,
}

impl QaService {
    /// Build the service from settings, with OpenAI embeddings and chat.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let fetcher = create_fetcher(settings)?;
        let chunker = create_chunker(&settings.chunking)?;
        let embedder = create_embedder(&settings.embedding)?;
        let model = Arc::new(OpenAIChatModel::new(&settings.rag)?);

        info!(
            "Using {} for embeddings and {} for answers",
            settings.embedding.model, settings.rag.model
        );

        Ok(Self::with_components(
            fetcher,
            IndexBuilder::new(chunker, embedder, &settings.index),
            RagEngine::new(model, prompts, settings.rag.max_context_chars),
        ))
    }

    /// Assemble the service from prebuilt parts.
    pub fn with_components(fetcher: TranscriptFetcher, indexer: IndexBuilder, engine: RagEngine) -> Self {
        Self {
            fetcher,
            indexer,
            engine,
        }
    }

    /// Answer a question about a video.
    #[instrument(skip(self, question))]
    pub async fn ask(&self, video: &str, question: &str) -> Result<AskResult> {
        if question.trim().is_empty() {
            return Err(VidqaError::InvalidInput("Question is empty".to_string()));
        }

        let transcript = self.transcript(video).await?;
        let retriever = self.indexer.retriever(&transcript.text).await?;
        let Answer { answer, context } = self.engine.answer(&retriever, question).await?;

        Ok(AskResult {
            video_id: transcript.video_id,
            provider: transcript.provider,
            answer,
            context,
        })
    }

    /// Fetch a video's transcript. `video` may be a URL or a bare ID.
    pub async fn transcript(&self, video: &str) -> Result<FetchedTranscript> {
        let video_id = resolve_video_id(video)?;
        self.fetcher.fetch(&video_id).await
    }

    /// Return the `k` transcript chunks most similar to `query`.
    /// `None` uses the configured top-k.
    #[instrument(skip(self, query))]
    pub async fn search(&self, video: &str, query: &str, k: Option<usize>) -> Result<SearchResponse> {
        if query.trim().is_empty() {
            return Err(VidqaError::InvalidInput("Query is empty".to_string()));
        }

        let transcript = self.transcript(video).await?;
        let mut retriever = self.indexer.retriever(&transcript.text).await?;
        if let Some(k) = k {
            retriever = retriever.with_k(k);
        }

        let results = retriever
            .retrieve(query.trim())
            .await?
            .into_iter()
            .map(ContextChunk::from)
            .collect();

        Ok(SearchResponse {
            video_id: transcript.video_id,
            provider: transcript.provider,
            results,
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.indexer.cache_stats()
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            index_cache: self.indexer.cache_stats(),
            transcripts_cached: self.fetcher.cached_count(),
            index_builds_in_flight: self.indexer.builds_in_flight(),
            providers: self.fetcher.provider_status(),
        }
    }
}

fn resolve_video_id(video: &str) -> Result<String> {
    parse_video_id(video).ok_or_else(|| {
        VidqaError::InvalidInput(format!("Not a YouTube video URL or ID: {}", video.trim()))
    })
}
