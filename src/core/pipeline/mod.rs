//! Card generation pipeline.
//!
//! One request runs end to end: build the prompt, call the language model
//! once, parse the reply into cards, synthesize audio for every card through
//! the rate-limited queue, package the deck(s), read them back as base64 and
//! remove every transient file.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quickcards::core::pipeline::{CardPipeline, CardRequest, PipelineConfig};
//! use quickcards::core::rate_limit::RateLimitConfig;
//! # use quickcards::core::{deck::DeckPackager, llm::LanguageModel, tts::SpeechSynthesizer};
//! # async fn example(
//! #     model: Arc<dyn LanguageModel>,
//! #     tts: Arc<dyn SpeechSynthesizer>,
//! #     packager: Arc<dyn DeckPackager>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = CardPipeline::new(
//!     model,
//!     tts,
//!     packager,
//!     PipelineConfig::default(),
//!     RateLimitConfig::default(),
//! );
//! let deck = pipeline
//!     .generate(&CardRequest {
//!         deck_name: "Animals".to_string(),
//!         words: "cat\ndog".to_string(),
//!         source_language: "English".to_string(),
//!         target_language: "Spanish".to_string(),
//!         include_reversed: false,
//!     })
//!     .await?;
//! println!("{}", deck.message);
//! # Ok(())
//! # }
//! ```

mod audio;
pub mod prompt;

use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::StreamExt;
use futures::stream::FuturesOrdered;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::cards::{Card, CardWithAudio, parse_cards};
use crate::core::deck::{DeckError, DeckFile, DeckPackager};
use crate::core::llm::{CompletionOptions, LLMError, LanguageModel};
use crate::core::rate_limit::{QueueError, RateLimitConfig, RateLimitSignal, RateLimitedQueue};
use crate::core::tts::{SpeechSynthesizer, TTSError};

pub use audio::AudioFile;
use audio::release_all;
pub use prompt::{generation_prompt, normalize_words, review_prompt};

/// Errors surfaced by the pipeline to the HTTP layer
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Language model request failed: {0}")]
    UpstreamModel(#[from] LLMError),

    /// Speech synthesis kept hitting the provider's rate limit after all retries
    #[error("Speech synthesis rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(#[source] TTSError),

    #[error("Deck packaging failed: {0}")]
    Packaging(#[from] DeckError),

    #[error("Internal pipeline error: {0}")]
    Internal(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<QueueError<TTSError>> for PipelineError {
    fn from(err: QueueError<TTSError>) -> Self {
        match err {
            QueueError::Task(e) if e.is_rate_limited() => {
                PipelineError::RateLimitExceeded(e.to_string())
            }
            QueueError::Task(e) => PipelineError::Synthesis(e),
            QueueError::Abandoned => {
                PipelineError::Internal("audio task was dropped before completing".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRequest {
    pub deck_name: String,
    /// One word or phrase per line
    pub words: String,
    pub source_language: String,
    pub target_language: String,
    pub include_reversed: bool,
}

/// Input for the preview and review entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRequest {
    pub input: String,
    pub source_language: String,
    pub target_language: String,
}

pub type PreviewRequest = InputRequest;
pub type ReviewRequest = InputRequest;

/// A deck archive encoded for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDeckFile {
    pub name: String,
    /// Base64 (standard alphabet, padded) archive bytes
    pub content: String,
}

impl From<DeckFile> for EncodedDeckFile {
    fn from(file: DeckFile) -> Self {
        Self {
            name: file.name,
            content: BASE64.encode(&file.content),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDeck {
    pub message: String,
    /// Cards in model reply order. Their audio files no longer exist once
    /// this value is returned; the audio lives inside the deck archives.
    pub cards: Vec<CardWithAudio>,
    pub deck_files: Vec<EncodedDeckFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Root for per-request deck output directories
    pub decks_dir: PathBuf,
    pub temperature: f32,
    pub generation_max_tokens: u32,
    pub preview_max_tokens: u32,
    pub review_max_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            decks_dir: PathBuf::from("decks"),
            temperature: 0.7,
            generation_max_tokens: 2048,
            preview_max_tokens: 256,
            review_max_tokens: 1024,
        }
    }
}

pub struct CardPipeline {
    model: Arc<dyn LanguageModel>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    packager: Arc<dyn DeckPackager>,
    audio_queue: RateLimitedQueue,
    config: PipelineConfig,
}

impl CardPipeline {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        packager: Arc<dyn DeckPackager>,
        config: PipelineConfig,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            model,
            synthesizer,
            packager,
            audio_queue: RateLimitedQueue::new(rate_limit),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate cards with audio and package them into deck archives.
    ///
    /// Nothing partial is returned: any model, synthesis or packaging failure
    /// aborts the request and the audio produced so far is removed.
    pub async fn generate(&self, request: &CardRequest) -> PipelineResult<GeneratedDeck> {
        if request.deck_name.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "deckName must not be empty".to_string(),
            ));
        }

        let words = normalize_words(&request.words);
        info!(
            "Generating deck '{}' from {} word(s), {} -> {}",
            request.deck_name,
            words.len(),
            request.source_language,
            request.target_language
        );

        let prompt = generation_prompt(&request.source_language, &request.target_language, &words);
        let reply = self
            .complete(&prompt, self.config.generation_max_tokens)
            .await?;

        let parsed = parse_cards(&reply);
        if parsed.dropped > 0 {
            warn!("Dropped {} malformed line(s) from model reply", parsed.dropped);
        }
        info!("Parsed {} card(s) from model reply", parsed.len());

        let (cards, audio_files) = self
            .synthesize_all(parsed.cards, &request.target_language)
            .await?;

        let deck_files = self.package_decks(&cards, request).await;

        // Audio is embedded in the archives now
        release_all(audio_files).await;
        let deck_files = deck_files?;

        let message = format!("Successfully generated {} flashcards", cards.len());
        info!("{message} for deck '{}'", request.deck_name);

        Ok(GeneratedDeck {
            message,
            cards,
            deck_files,
        })
    }

    /// Parse a single card from the first input line without audio or packaging.
    pub async fn preview(&self, request: &PreviewRequest) -> PipelineResult<Option<Card>> {
        let first = normalize_words(&request.input)
            .into_iter()
            .next()
            .ok_or_else(|| {
                PipelineError::InvalidInput(
                    "input must contain at least one non-empty line".to_string(),
                )
            })?;

        let prompt = generation_prompt(
            &request.source_language,
            &request.target_language,
            std::slice::from_ref(&first),
        );
        let reply = self
            .complete(&prompt, self.config.preview_max_tokens)
            .await?;

        Ok(parse_cards(&reply).cards.into_iter().next())
    }

    /// Ask the model to check the input lines; returns its feedback verbatim.
    pub async fn review(&self, request: &ReviewRequest) -> PipelineResult<String> {
        let lines = normalize_words(&request.input);
        if lines.is_empty() {
            return Err(PipelineError::InvalidInput(
                "input must contain at least one non-empty line".to_string(),
            ));
        }

        let prompt = review_prompt(&request.source_language, &request.target_language, &lines);
        self.complete(&prompt, self.config.review_max_tokens).await
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> PipelineResult<String> {
        let options = CompletionOptions {
            max_tokens,
            temperature: self.config.temperature,
        };
        self.model.complete(prompt, &options).await.map_err(|e| {
            error!("Language model ({}) failed: {}", self.model.model_name(), e);
            PipelineError::UpstreamModel(e)
        })
    }

    /// Queue one synthesis task per card and collect results in card order.
    ///
    /// On the first failure the remaining futures are dropped, which makes
    /// the queue skip the tasks that have not started yet.
    async fn synthesize_all(
        &self,
        cards: Vec<Card>,
        language: &str,
    ) -> PipelineResult<(Vec<CardWithAudio>, Vec<AudioFile>)> {
        let mut pending = FuturesOrdered::new();

        for card in cards {
            let synthesizer = self.synthesizer.clone();
            let text = card.back.clone();
            let id = card.id.clone();
            let language = language.to_string();

            let result = self.audio_queue.submit(move || {
                let synthesizer = synthesizer.clone();
                let text = text.clone();
                let id = id.clone();
                let language = language.clone();
                async move {
                    synthesizer
                        .synthesize(&text, &id, &language)
                        .await
                        .map(AudioFile::new)
                }
            });
            pending.push_back(async move { result.await.map(|audio| (card, audio)) });
        }

        let mut cards_with_audio = Vec::with_capacity(pending.len());
        let mut audio_files = Vec::with_capacity(pending.len());

        while let Some(result) = pending.next().await {
            match result {
                Ok((card, audio)) => {
                    cards_with_audio.push(CardWithAudio::new(card, audio.path().to_path_buf()));
                    audio_files.push(audio);
                }
                Err(err) => {
                    let err = PipelineError::from(err);
                    error!(
                        "Audio synthesis ({}) aborted after {} card(s): {}",
                        self.synthesizer.provider_name(),
                        audio_files.len(),
                        err
                    );
                    release_all(audio_files).await;
                    return Err(err);
                }
            }
        }

        Ok((cards_with_audio, audio_files))
    }

    /// Package into a request-scoped directory, read the archives back and
    /// remove the directory.
    async fn package_decks(
        &self,
        cards: &[CardWithAudio],
        request: &CardRequest,
    ) -> PipelineResult<Vec<EncodedDeckFile>> {
        let output_dir = self.config.decks_dir.join(Uuid::new_v4().to_string());

        let result = async {
            let packaged = self
                .packager
                .package(
                    cards,
                    &request.deck_name,
                    request.include_reversed,
                    &output_dir,
                )
                .await?;

            let mut files = Vec::with_capacity(packaged.len());
            for deck in &packaged {
                files.push(EncodedDeckFile::from(DeckFile::take(deck).await?));
            }
            Ok::<_, DeckError>(files)
        }
        .await;

        if let Err(e) = tokio::fs::remove_dir_all(&output_dir).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(
                "Failed to remove deck directory {}: {}",
                output_dir.display(),
                e
            );
        }

        result.map_err(|e| {
            error!("Packaging deck '{}' failed: {}", request.deck_name, e);
            PipelineError::Packaging(e)
        })
    }
}
