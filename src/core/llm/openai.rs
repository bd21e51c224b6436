//! OpenAI chat-completions client.
//!
//! Posts a two-message conversation (fixed tutor system message plus the
//! prompt) to `{base_url}/chat/completions` and returns the first choice.
//! Transient failures are retried with exponential backoff up to
//! `max_retries` times; other 4xx responses fail immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::base::{CompletionOptions, LLMError, LLMResult, LanguageModel};
use crate::utils::req_manager::ReqManager;

pub const SYSTEM_MESSAGE: &str = "You are a helpful language tutor.";
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, PartialEq)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    /// API root without trailing slash, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each subsequent retry
    pub retry_backoff: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    code: Option<String>,
}

pub struct OpenAIClient {
    config: OpenAIConfig,
    req_manager: Arc<ReqManager>,
}

impl OpenAIClient {
    pub fn new(config: OpenAIConfig, req_manager: Arc<ReqManager>) -> LLMResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::InvalidConfiguration(
                "OpenAI API key is required".to_string(),
            ));
        }
        Ok(Self {
            config,
            req_manager,
        })
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn complete_once(&self, prompt: &str, options: &CompletionOptions) -> LLMResult<String> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let guard = self
            .req_manager
            .acquire()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        let request = guard
            .client()
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.timeout)
            .json(&body);

        let response = guard.send(request).await.map_err(map_transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let (message, code) = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => (envelope.error.message, envelope.error.code),
                Err(_) if text.is_empty() => (
                    status.canonical_reason().unwrap_or("unknown").to_string(),
                    None,
                ),
                Err(_) => (text, None),
            };
            return Err(LLMError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LLMError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(LLMError::EmptyResponse)
    }
}

fn map_transport_error(err: reqwest::Error) -> LLMError {
    if err.is_timeout() {
        LLMError::Timeout(err.to_string())
    } else {
        LLMError::Network(err.to_string())
    }
}

#[async_trait]
impl LanguageModel for OpenAIClient {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> LLMResult<String> {
        let mut attempt = 0;

        loop {
            match self.complete_once(prompt, options).await {
                Ok(content) => {
                    debug!("Model replied with {} characters", content.len());
                    return Ok(content);
                }
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    let delay = self
                        .config
                        .retry_backoff
                        .saturating_mul(2u32.saturating_pow(attempt));
                    warn!(
                        "OpenAI request failed: {}. Retry {}/{} in {:?}",
                        err,
                        attempt + 1,
                        self.config.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
