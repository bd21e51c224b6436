pub mod cards;
pub mod deck;
pub mod llm;
pub mod pipeline;
pub mod rate_limit;
pub mod state;
pub mod tts;

// Re-export commonly used types for convenience
pub use cards::{Card, CardWithAudio, ParsedCards, parse_cards};

pub use deck::{ApkgPackager, DeckError, DeckPackager, DeckResult, PackagedDeck};

pub use llm::{CompletionOptions, LLMError, LLMResult, LanguageModel, OpenAIClient, OpenAIConfig};

pub use pipeline::{
    CardPipeline, CardRequest, GeneratedDeck, PipelineConfig, PipelineError, PipelineResult,
    PreviewRequest, ReviewRequest,
};

pub use rate_limit::{QueueError, RateLimitConfig, RateLimitedQueue};

pub use tts::{AzureTTS, AzureTTSConfig, SpeechSynthesizer, TTSError, TTSResult};

// Re-export CoreState for external use
pub use state::CoreState;
