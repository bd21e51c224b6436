//! Language-model access for card generation.

mod base;
pub mod openai;

pub use base::{CompletionOptions, LLMError, LLMResult, LanguageModel};
pub use openai::{OpenAIClient, OpenAIConfig};
