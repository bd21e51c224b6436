//! Microsoft Azure Text-to-Speech provider.
//!
//! - **config**: [`AzureTTSConfig`], the MP3 output encodings, the language
//!   to voice and locale tables and the SSML helpers.
//! - **provider**: [`AzureTTS`], the [`SpeechSynthesizer`](crate::core::tts::SpeechSynthesizer)
//!   used for card audio, and the [`AzureRequestBuilder`] behind it.
//!
//! # Azure TTS API Reference
//!
//! - TTS endpoint: `https://{region}.tts.speech.microsoft.com/cognitiveservices/v1`
//! - Required headers: `Ocp-Apim-Subscription-Key`, `Content-Type: application/ssml+xml`,
//!   `X-Microsoft-OutputFormat`
//! - Documentation: <https://learn.microsoft.com/en-us/azure/ai-services/speech-service/rest-text-to-speech>

mod config;
mod provider;

pub use config::{
    AZURE_OUTPUT_FORMAT_HEADER, AZURE_SUBSCRIPTION_KEY_HEADER, AzureAudioEncoding,
    AzureTTSConfig, DEFAULT_LOCALE, DEFAULT_VOICE, build_ssml, escape_xml, locale_for_language,
    strip_line_breaks, voice_for_language,
};
pub use provider::{AzureRequestBuilder, AzureTTS};
