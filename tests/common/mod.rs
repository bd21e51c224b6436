//! Deterministic stand-ins for the language model and speech synthesizer.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use quickcards::core::deck::ApkgPackager;
use quickcards::core::llm::{CompletionOptions, LLMError, LLMResult, LanguageModel};
use quickcards::core::pipeline::{CardPipeline, PipelineConfig};
use quickcards::core::rate_limit::RateLimitConfig;
use quickcards::core::tts::{SpeechSynthesizer, TTSError, TTSResult};

/// Replies with a fixed text and records every prompt it receives.
pub struct ScriptedModel {
    reply: Result<String, u16>,
    pub prompts: Mutex<Vec<(String, CompletionOptions)>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with an API error carrying `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> LLMResult<String> {
        self.prompts.lock().push((prompt.to_string(), *options));
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(status) => Err(LLMError::Api {
                status: *status,
                code: None,
                message: "scripted failure".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisMode {
    Succeed,
    AlwaysRateLimited,
    /// Succeeds for the first `n` cards, then returns a provider error
    FailAfter(usize),
}

/// Writes a few fake MP3 bytes per card to `audio_dir`.
pub struct FileSynthesizer {
    audio_dir: PathBuf,
    mode: SynthesisMode,
    pub calls: Mutex<Vec<(String, String, String)>>,
}

impl FileSynthesizer {
    pub fn new(audio_dir: &Path, mode: SynthesisMode) -> Self {
        Self {
            audio_dir: audio_dir.to_path_buf(),
            mode,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl SpeechSynthesizer for FileSynthesizer {
    async fn synthesize(&self, text: &str, id: &str, language: &str) -> TTSResult<PathBuf> {
        let call_index = {
            let mut calls = self.calls.lock();
            calls.push((text.to_string(), id.to_string(), language.to_string()));
            calls.len() - 1
        };

        match self.mode {
            SynthesisMode::AlwaysRateLimited => {
                return Err(TTSError::RateLimited("scripted 429".to_string()));
            }
            SynthesisMode::FailAfter(n) if call_index >= n => {
                return Err(TTSError::ProviderError {
                    status: 500,
                    message: "scripted failure".to_string(),
                });
            }
            _ => {}
        }

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let path = self.audio_dir.join(format!("{id}.mp3"));
        tokio::fs::write(&path, [0xFF, 0xF3, 0x44, 0xC4]).await?;
        Ok(path)
    }

    fn provider_name(&self) -> &'static str {
        "file"
    }
}

/// Queue settings that keep tests fast.
pub fn fast_rate_limit() -> RateLimitConfig {
    RateLimitConfig {
        requests_per_second: 1000,
        max_retries: 2,
        initial_backoff: Duration::from_millis(1),
    }
}

pub fn pipeline(
    model: Arc<ScriptedModel>,
    synthesizer: Arc<FileSynthesizer>,
    decks_dir: &Path,
) -> CardPipeline {
    CardPipeline::new(
        model,
        synthesizer,
        Arc::new(ApkgPackager::new()),
        PipelineConfig {
            decks_dir: decks_dir.to_path_buf(),
            ..Default::default()
        },
        fast_rate_limit(),
    )
}

/// Number of entries (files or directories) directly under `dir`; 0 when missing.
pub fn entry_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
