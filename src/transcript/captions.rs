//! YouTube caption tracks, fetched through `yt-transcript-rs`.

use super::normalize::normalize_segments;
use super::TranscriptProvider;
use crate::error::{Result, VidqaError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, instrument};
use yt_transcript_rs::api::YouTubeTranscriptApi;
use yt_transcript_rs::errors::{CouldNotRetrieveTranscript, CouldNotRetrieveTranscriptReason};

/// A caption track available for a video.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub language_code: String,
    pub is_generated: bool,
}

/// Fetches the caption tracks YouTube publishes for a video.
pub struct CaptionTrackProvider {
    name: &'static str,
    api: YouTubeTranscriptApi,
    languages: Vec<String>,
    any_language: bool,
    timeout: Duration,
}

impl CaptionTrackProvider {
    /// Provider restricted to the preferred languages.
    pub fn new(languages: Vec<String>, timeout: Duration) -> Result<Self> {
        Self::build("captions", languages, timeout, false)
    }

    /// Provider that falls back to the first track in any language once the
    /// preferred languages are exhausted.
    pub fn any_language(languages: Vec<String>, timeout: Duration) -> Result<Self> {
        Self::build("captions-any", languages, timeout, true)
    }

    fn build(
        name: &'static str,
        languages: Vec<String>,
        timeout: Duration,
        any_language: bool,
    ) -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| VidqaError::provider(name, e.to_string()))?;
        Ok(Self {
            name,
            api,
            languages,
            any_language,
            timeout,
        })
    }

    async fn fetch_in(&self, video_id: &str, languages: &[&str]) -> Result<Option<String>> {
        let fetched = tokio::time::timeout(
            self.timeout,
            self.api.fetch_transcript(video_id, languages, false),
        )
        .await
        .map_err(|_| {
            VidqaError::provider(self.name, format!("timed out after {:?}", self.timeout))
        })?;

        match fetched {
            Ok(transcript) => {
                debug!(
                    "Using {} caption track '{}'",
                    if transcript.is_generated { "generated" } else { "manual" },
                    transcript.language_code
                );
                let text = normalize_segments([transcript.text()]);
                Ok((!text.is_empty()).then_some(text))
            }
            Err(e) => self.classify(video_id, e),
        }
    }

    /// The first track listed for the video, whatever its language.
    async fn first_track(&self, video_id: &str) -> Result<Option<CaptionTrack>> {
        let listed = tokio::time::timeout(self.timeout, self.api.list_transcripts(video_id))
            .await
            .map_err(|_| {
                VidqaError::provider(self.name, format!("timed out after {:?}", self.timeout))
            })?;

        match listed {
            Ok(list) => {
                let tracks: Vec<CaptionTrack> = list
                    .transcripts()
                    .map(|t| CaptionTrack {
                        language_code: t.language_code.clone(),
                        is_generated: t.is_generated,
                    })
                    .collect();
                Ok(select_any_track(&tracks).cloned())
            }
            Err(e) => self.classify(video_id, e).map(|_| None),
        }
    }

    fn classify(&self, video_id: &str, error: CouldNotRetrieveTranscript) -> Result<Option<String>> {
        if is_unavailable(error.reason.as_ref()) {
            info!("No captions from {} for video {}: {}", self.name, video_id, error);
            Ok(None)
        } else {
            Err(VidqaError::provider(self.name, error.to_string()))
        }
    }
}

#[async_trait]
impl TranscriptProvider for CaptionTrackProvider {
    fn name(&self) -> &str {
        self.name
    }

    #[instrument(skip(self), fields(provider = self.name))]
    async fn fetch(&self, video_id: &str) -> Result<Option<String>> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();
        let preferred = self.fetch_in(video_id, &languages).await?;
        if preferred.is_some() || !self.any_language {
            return Ok(preferred);
        }

        let Some(track) = self.first_track(video_id).await? else {
            info!("Video {} has no caption tracks", video_id);
            return Ok(None);
        };
        self.fetch_in(video_id, &[track.language_code.as_str()]).await
    }
}

/// Whether a retrieval failure means the video simply has no usable
/// captions, as opposed to the provider itself failing.
pub fn is_unavailable(reason: Option<&CouldNotRetrieveTranscriptReason>) -> bool {
    use CouldNotRetrieveTranscriptReason as Reason;

    matches!(
        reason,
        Some(
            Reason::TranscriptsDisabled { .. }
                | Reason::NoTranscriptFound { .. }
                | Reason::VideoUnavailable { .. }
                | Reason::VideoUnplayable { .. }
                | Reason::InvalidVideoId { .. }
                | Reason::AgeRestricted { .. }
        )
    )
}

/// Pick the first available track, in any language.
pub fn select_any_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks.first()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(lang: &str, is_generated: bool) -> CaptionTrack {
        CaptionTrack {
            language_code: lang.to_string(),
            is_generated,
        }
    }

    #[test]
    fn test_select_any_track_takes_first() {
        let tracks = vec![track("fr", true), track("de", false)];
        assert_eq!(select_any_track(&tracks).unwrap().language_code, "fr");
        assert!(select_any_track(&[]).is_none());
    }

    #[test]
    fn test_missing_captions_are_not_failures() {
        use CouldNotRetrieveTranscriptReason as Reason;

        assert!(is_unavailable(Some(&Reason::TranscriptsDisabled)));
        assert!(is_unavailable(Some(&Reason::VideoUnavailable)));
        assert!(is_unavailable(Some(&Reason::InvalidVideoId)));
        assert!(is_unavailable(Some(&Reason::AgeRestricted)));
    }

    #[test]
    fn test_transport_errors_are_failures() {
        use CouldNotRetrieveTranscriptReason as Reason;

        assert!(!is_unavailable(Some(&Reason::YouTubeRequestFailed(
            "connection reset".to_string()
        ))));
        assert!(!is_unavailable(Some(&Reason::YouTubeDataUnparsable(
            "unexpected player response".to_string()
        ))));
        assert!(!is_unavailable(None));
    }

    #[test]
    fn test_provider_names() {
        let timeout = Duration::from_secs(5);
        let langs = vec!["en".to_string()];
        assert_eq!(CaptionTrackProvider::new(langs.clone(), timeout).unwrap().name(), "captions");
        assert_eq!(
            CaptionTrackProvider::any_language(langs, timeout).unwrap().name(),
            "captions-any"
        );
    }
}
