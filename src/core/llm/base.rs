use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by language-model providers
#[derive(Debug, Error)]
pub enum LLMError {
    /// The provider answered with a non-success status
    #[error("Model API error (status {status}): {message}")]
    Api {
        status: u16,
        /// Provider error code, e.g. `rate_limit_exceeded`
        code: Option<String>,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("No content in response from model")]
    EmptyResponse,

    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl LLMError {
    /// Whether another attempt may succeed: transport failures, timeouts,
    /// HTTP 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            LLMError::Network(_) | LLMError::Timeout(_) => true,
            LLMError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            LLMError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            LLMError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

pub type LLMResult<T> = Result<T, LLMError>;

/// Sampling settings for a single completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            temperature: 0.7,
        }
    }
}

/// A chat-style language model that answers one prompt with one reply.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send `prompt` and return the reply text, trimmed.
    ///
    /// An empty reply is an error, never `Ok("")`.
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> LLMResult<String>;

    fn model_name(&self) -> &str;
}
