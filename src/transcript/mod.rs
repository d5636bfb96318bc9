//! Transcript acquisition.
//!
//! A video's captions are fetched through a prioritized chain of providers,
//! each of which can fail independently:
//!
//! - **captions**: YouTube caption tracks in the preferred languages
//! - **yt-dlp**: subtitle download through the `yt-dlp` tool
//! - **captions-any**: caption tracks in any language, as a last resort

mod breaker;
mod captions;
mod fetcher;
pub mod normalize;
mod ytdlp;

pub use breaker::{CircuitBreaker, CircuitState};
pub use captions::{CaptionTrack, CaptionTrackProvider};
pub use fetcher::{ProviderStatus, TranscriptFetcher};
pub use ytdlp::YtDlpProvider;

use crate::config::Settings;
use crate::error::{Result, VidqaError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A transcript and the provider that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedTranscript {
    pub video_id: String,
    /// Normalized plain text.
    pub text: String,
    pub provider: String,
}

impl FetchedTranscript {
    /// Length of the text in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Short provider name used in logs and config.
    fn name(&self) -> &str;

    /// Fetch captions for a video.
    ///
    /// `Ok(None)` means the provider worked but the video has no usable
    /// captions for it. `Err` means the provider itself failed.
    async fn fetch(&self, video_id: &str) -> Result<Option<String>>;
}

/// Build the provider chain named in the settings.
pub fn create_providers(settings: &Settings) -> Result<Vec<Arc<dyn TranscriptProvider>>> {
    let languages = settings.transcript.languages.clone();
    let timeout = Duration::from_secs(settings.transcript.request_timeout_secs);

    let mut providers: Vec<Arc<dyn TranscriptProvider>> = Vec::new();
    for name in &settings.transcript.providers {
        let provider: Arc<dyn TranscriptProvider> = match name.to_lowercase().as_str() {
            "captions" => Arc::new(CaptionTrackProvider::new(languages.clone(), timeout)?),
            "captions-any" => Arc::new(CaptionTrackProvider::any_language(languages.clone(), timeout)?),
            "yt-dlp" | "ytdlp" => Arc::new(YtDlpProvider::new(languages.clone(), settings.temp_dir())),
            other => {
                return Err(VidqaError::Config(format!(
                    "Unknown transcript provider: {}",
                    other
                )))
            }
        };
        providers.push(provider);
    }

    if providers.is_empty() {
        return Err(VidqaError::Config(
            "At least one transcript provider must be configured".to_string(),
        ));
    }

    Ok(providers)
}

/// Build a fetcher from settings.
pub fn create_fetcher(settings: &Settings) -> Result<TranscriptFetcher> {
    Ok(TranscriptFetcher::new(
        create_providers(settings)?,
        settings.transcript.retry.policy(),
        &settings.transcript.circuit_breaker,
        settings.transcript.cache_size,
    ))
}
