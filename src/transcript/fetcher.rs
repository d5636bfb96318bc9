//! Transcript acquisition across a prioritized provider chain.

use super::breaker::{CircuitBreaker, CircuitState};
use super::{FetchedTranscript, TranscriptProvider};
use crate::config::CircuitBreakerSettings;
use crate::error::{Result, VidqaError};
use crate::flight::SingleFlight;
use crate::retry::RetryPolicy;
use futures::FutureExt;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Health of one provider in the chain.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
}

struct ProviderSlot {
    provider: Arc<dyn TranscriptProvider>,
    breaker: CircuitBreaker,
}

struct FetcherInner {
    providers: Vec<ProviderSlot>,
    retry: RetryPolicy,
    cache: Mutex<LruCache<String, FetchedTranscript>>,
}

/// Fetches transcripts, trying each provider in order until one yields text.
///
/// Successful results are memoized in a bounded LRU and concurrent requests
/// for the same video share a single fetch.
pub struct TranscriptFetcher {
    inner: Arc<FetcherInner>,
    flights: SingleFlight<String, Option<FetchedTranscript>>,
}

impl TranscriptFetcher {
    pub fn new(
        providers: Vec<Arc<dyn TranscriptProvider>>,
        retry: RetryPolicy,
        breaker: &CircuitBreakerSettings,
        cache_size: usize,
    ) -> Self {
        let providers = providers
            .into_iter()
            .map(|provider| ProviderSlot {
                provider,
                breaker: CircuitBreaker::new(
                    breaker.failure_threshold,
                    Duration::from_secs(breaker.cooldown_secs),
                ),
            })
            .collect();

        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);

        Self {
            inner: Arc::new(FetcherInner {
                providers,
                retry,
                cache: Mutex::new(LruCache::new(capacity)),
            }),
            flights: SingleFlight::new(),
        }
    }

    /// Fetch the transcript for a video ID.
    #[instrument(skip(self))]
    pub async fn fetch(&self, video_id: &str) -> Result<FetchedTranscript> {
        if let Some(hit) = self.inner.cached(video_id) {
            debug!("Transcript cache hit for {}", video_id);
            return Ok(hit);
        }

        let inner = self.inner.clone();
        let id = video_id.to_string();
        let fetched = self
            .flights
            .run(video_id.to_string(), move || {
                async move { inner.fetch_uncached(&id).await }.boxed()
            })
            .await;

        fetched.ok_or_else(|| VidqaError::TranscriptUnavailable(video_id.to_string()))
    }

    /// Circuit breaker status of every provider, in chain order.
    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        self.inner
            .providers
            .iter()
            .map(|slot| ProviderStatus {
                name: slot.provider.name().to_string(),
                state: slot.breaker.state(),
                consecutive_failures: slot.breaker.consecutive_failures(),
            })
            .collect()
    }

    /// Number of memoized transcripts.
    pub fn cached_count(&self) -> usize {
        self.inner.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl FetcherInner {
    fn cached(&self, video_id: &str) -> Option<FetchedTranscript> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(video_id).cloned()
    }

    async fn fetch_uncached(&self, video_id: &str) -> Option<FetchedTranscript> {
        // A waiter may have been queued behind a fetch that already filled the cache.
        if let Some(hit) = self.cached(video_id) {
            return Some(hit);
        }

        for slot in &self.providers {
            let name = slot.provider.name();

            if !slot.breaker.try_acquire() {
                warn!("Skipping provider {}: circuit open", name);
                continue;
            }

            let label = format!("{} transcript fetch for {}", name, video_id);
            let result = self
                .retry
                .run(&label, || slot.provider.fetch(video_id))
                .await;

            match result {
                Ok(Some(text)) if !text.trim().is_empty() => {
                    slot.breaker.record_success();
                    let transcript = FetchedTranscript {
                        video_id: video_id.to_string(),
                        text,
                        provider: name.to_string(),
                    };
                    info!(
                        "Fetched transcript for {} from {} ({} chars)",
                        video_id,
                        name,
                        transcript.char_count()
                    );
                    self.cache
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .put(video_id.to_string(), transcript.clone());
                    return Some(transcript);
                }
                Ok(_) => {
                    slot.breaker.record_success();
                    info!("Provider {} has no transcript for {}", name, video_id);
                }
                Err(e) => {
                    slot.breaker.record_failure();
                    warn!("Provider {} failed for {}: {}", name, video_id, e);
                }
            }
        }

        warn!("No provider produced a transcript for {}", video_id);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that replays a scripted sequence of outcomes.
    struct ScriptedProvider {
        name: &'static str,
        script: Mutex<Vec<Result<Option<String>>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedProvider {
        fn new(name: &'static str, script: Vec<Result<Option<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            })
        }

        fn slow(name: &'static str, text: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name,
                script: Mutex::new(vec![Ok(Some(text.to_string()))]),
                calls: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TranscriptProvider for ScriptedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self, _video_id: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.remove(0)
            } else {
                match script.first() {
                    Some(Ok(v)) => Ok(v.clone()),
                    Some(Err(_)) => Err(VidqaError::provider(self.name, "down")),
                    None => Ok(None),
                }
            }
        }
    }

    fn breaker_settings(threshold: u32) -> CircuitBreakerSettings {
        CircuitBreakerSettings {
            failure_threshold: threshold,
            cooldown_secs: 60,
        }
    }

    fn fetcher(providers: Vec<Arc<dyn TranscriptProvider>>, threshold: u32) -> TranscriptFetcher {
        TranscriptFetcher::new(providers, RetryPolicy::immediate(3), &breaker_settings(threshold), 8)
    }

    #[tokio::test]
    async fn test_first_provider_wins() {
        let primary = ScriptedProvider::new("primary", vec![Ok(Some("hello world".to_string()))]);
        let backup = ScriptedProvider::new("backup", vec![Ok(Some("unused".to_string()))]);
        let fetcher = fetcher(vec![primary.clone(), backup.clone()], 5);

        let transcript = fetcher.fetch("abc").await.unwrap();
        assert_eq!(transcript.text, "hello world");
        assert_eq!(transcript.provider, "primary");
        assert_eq!(backup.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_when_no_captions() {
        let primary = ScriptedProvider::new("primary", vec![Ok(None)]);
        let blank = ScriptedProvider::new("blank", vec![Ok(Some("   ".to_string()))]);
        let backup = ScriptedProvider::new("backup", vec![Ok(Some("from backup".to_string()))]);
        let fetcher = fetcher(vec![primary.clone(), blank.clone(), backup.clone()], 5);

        let transcript = fetcher.fetch("abc").await.unwrap();
        assert_eq!(transcript.provider, "backup");
        // "No captions" is not retried
        assert_eq!(primary.calls(), 1);
        assert_eq!(blank.calls(), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let flaky = ScriptedProvider::new(
            "flaky",
            vec![
                Err(VidqaError::provider("flaky", "503")),
                Err(VidqaError::provider("flaky", "503")),
                Ok(Some("third time lucky".to_string())),
            ],
        );
        let fetcher = fetcher(vec![flaky.clone()], 5);

        let transcript = fetcher.fetch("abc").await.unwrap();
        assert_eq!(transcript.text, "third time lucky");
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test]
    async fn test_all_providers_fail() {
        let down = ScriptedProvider::new("down", vec![Err(VidqaError::provider("down", "x"))]);
        let empty = ScriptedProvider::new("empty", vec![Ok(None)]);
        let fetcher = fetcher(vec![down.clone(), empty], 5);

        let err = fetcher.fetch("abc").await.unwrap_err();
        assert!(matches!(err, VidqaError::TranscriptUnavailable(ref id) if id == "abc"));
        assert_eq!(down.calls(), 3);
        assert_eq!(fetcher.cached_count(), 0);
    }

    #[tokio::test]
    async fn test_results_are_memoized() {
        let primary = ScriptedProvider::new("primary", vec![Ok(Some("cached text".to_string()))]);
        let fetcher = fetcher(vec![primary.clone()], 5);

        fetcher.fetch("abc").await.unwrap();
        let again = fetcher.fetch("abc").await.unwrap();
        assert_eq!(again.text, "cached text");
        assert_eq!(primary.calls(), 1);
        assert_eq!(fetcher.cached_count(), 1);
    }

    #[tokio::test]
    async fn test_open_breaker_skips_provider() {
        let down = ScriptedProvider::new("down", vec![Err(VidqaError::provider("down", "x"))]);
        let backup = ScriptedProvider::new("backup", vec![Ok(Some("ok".to_string()))]);
        let fetcher = TranscriptFetcher::new(
            vec![down.clone(), backup],
            RetryPolicy::immediate(1),
            &breaker_settings(2),
            0,
        );

        // Cache size 0 is clamped to 1, so use distinct ids to avoid hits.
        fetcher.fetch("one").await.unwrap();
        fetcher.fetch("two").await.unwrap();
        assert_eq!(down.calls(), 2);

        let status = fetcher.provider_status();
        assert_eq!(status[0].state, CircuitState::Open);
        assert_eq!(status[1].state, CircuitState::Closed);

        fetcher.fetch("three").await.unwrap();
        assert_eq!(down.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_are_deduplicated() {
        let slow = ScriptedProvider::slow("slow", "shared text", Duration::from_millis(50));
        let fetcher = Arc::new(fetcher(vec![slow.clone()], 5));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let fetcher = fetcher.clone();
                tokio::spawn(async move { fetcher.fetch("same").await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().text, "shared text");
        }
        assert_eq!(slow.calls(), 1);
    }
}
