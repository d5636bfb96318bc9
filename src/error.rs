//! Error types for vidqa.

use std::sync::Arc;
use thiserror::Error;

/// Library-level error type for vidqa operations.
#[derive(Error, Debug)]
pub enum VidqaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript provider '{provider}' failed: {message}")]
    TranscriptProvider { provider: String, message: String },

    #[error("No transcript available for video {0}")]
    TranscriptUnavailable(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An error produced once by a deduplicated operation and handed to every waiter.
    #[error(transparent)]
    Shared(Arc<VidqaError>),
}

impl VidqaError {
    /// Whether retrying the failed operation could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            VidqaError::Http(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                e.status()
                    .map(|s| s.is_server_error() || s.as_u16() == 429 || s.as_u16() == 408)
                    .unwrap_or(e.is_request())
            }
            VidqaError::OpenAI(_) | VidqaError::ToolFailed(_) | VidqaError::TranscriptProvider { .. } => {
                true
            }
            VidqaError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::ConnectionReset
            ),
            VidqaError::Shared(inner) => inner.is_retryable(),
            _ => false,
        }
    }

    /// Shorthand for a provider failure.
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        VidqaError::TranscriptProvider {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Unwraps shared errors down to the one that actually happened.
    pub fn root(&self) -> &VidqaError {
        match self {
            VidqaError::Shared(inner) => inner.root(),
            other => other,
        }
    }
}

/// Result type alias for vidqa operations.
pub type Result<T> = std::result::Result<T, VidqaError>;
