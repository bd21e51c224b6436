pub mod azure;
mod base;

pub use azure::{AzureTTS, AzureTTSConfig};
pub use base::{SpeechSynthesizer, TTSError, TTSResult};
