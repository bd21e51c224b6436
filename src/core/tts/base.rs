//! Base contract for the speech synthesizers used by the card pipeline.
//!
//! A synthesizer turns the back side of a card into an audio file on local
//! storage. Implementations are expected to be cheap to share behind an
//! `Arc` and safe to call from the rate-limited queue.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use async_trait::async_trait;
//! use quickcards::core::tts::{SpeechSynthesizer, TTSResult};
//!
//! struct Silence;
//!
//! #[async_trait]
//! impl SpeechSynthesizer for Silence {
//!     async fn synthesize(&self, _text: &str, id: &str, _language: &str) -> TTSResult<PathBuf> {
//!         let path = PathBuf::from(format!("{id}.mp3"));
//!         tokio::fs::write(&path, b"").await?;
//!         Ok(path)
//!     }
//! }
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::rate_limit::RateLimitSignal;

/// Errors raised by speech synthesis providers
#[derive(Debug, Error)]
pub enum TTSError {
    /// The provider rejected the request with HTTP 429
    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    #[error("Provider error (status {status}): {message}")]
    ProviderError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Audio generation failed: {0}")]
    AudioGenerationFailed(String),

    #[error("Failed to write audio file: {0}")]
    Io(#[from] std::io::Error),
}

impl TTSError {
    /// HTTP status reported by the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TTSError::RateLimited(_) => Some(429),
            TTSError::ProviderError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl RateLimitSignal for TTSError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, TTSError::RateLimited(_))
    }
}

impl From<reqwest::Error> for TTSError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().is_some_and(|s| s.as_u16() == 429) {
            TTSError::RateLimited(err.to_string())
        } else {
            TTSError::NetworkError(err.to_string())
        }
    }
}

pub type TTSResult<T> = Result<T, TTSError>;

/// Converts text into an audio file on local storage.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` spoken in `language` and write it to a file named
    /// after `id`. Returns the path of the written file.
    ///
    /// `language` is the display name chosen by the user (e.g. "Spanish");
    /// mapping it to a voice is the implementation's job.
    async fn synthesize(&self, text: &str, id: &str, language: &str) -> TTSResult<PathBuf>;

    /// Short provider identifier for logs.
    fn provider_name(&self) -> &'static str {
        "unknown"
    }
}
