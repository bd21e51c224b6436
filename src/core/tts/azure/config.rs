//! Configuration types for the Azure Text-to-Speech REST API.
//!
//! Holds the output encodings, the language to voice tables and the SSML
//! helpers used to build request bodies.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// HTTP header name for Azure TTS output format.
pub const AZURE_OUTPUT_FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";

/// HTTP header carrying the subscription key.
pub const AZURE_SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Voice used when the requested language has no dedicated entry.
pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";

/// Locale used when the requested language has no dedicated entry.
pub const DEFAULT_LOCALE: &str = "en-US";

// language name, locale, neural voice
const VOICES: &[(&str, &str, &str)] = &[
    ("Arabic", "ar-SA", "ar-SA-HamedNeural"),
    ("Mandarin Chinese", "zh-CN", "zh-CN-XiaoxiaoNeural"),
    ("Japanese", "ja-JP", "ja-JP-NanamiNeural"),
    ("Portuguese (Brazil)", "pt-BR", "pt-BR-ManuelaNeural"),
    ("Portuguese", "pt-BR", "pt-BR-FranciscaNeural"),
    ("Spanish", "es-MX", "es-MX-DaliaNeural"),
    ("English", "en-US", "en-US-JennyNeural"),
];

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

/// MP3 output formats accepted by the `X-Microsoft-OutputFormat` header.
///
/// Cards embed audio through `[sound:...]` tags, which the flashcard apps
/// play as MP3, so only MP3 encodings are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AzureAudioEncoding {
    /// 16kHz, 32kbps MP3 mono
    Audio16Khz32KbitrateMonoMp3,
    /// 24kHz, 48kbps MP3 mono
    #[default]
    Audio24Khz48KbitrateMonoMp3,
    /// 24kHz, 96kbps MP3 mono
    Audio24Khz96KbitrateMonoMp3,
    /// 48kHz, 96kbps MP3 mono
    Audio48Khz96KbitrateMonoMp3,
}

impl AzureAudioEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio16Khz32KbitrateMonoMp3 => "audio-16khz-32kbitrate-mono-mp3",
            Self::Audio24Khz48KbitrateMonoMp3 => "audio-24khz-48kbitrate-mono-mp3",
            Self::Audio24Khz96KbitrateMonoMp3 => "audio-24khz-96kbitrate-mono-mp3",
            Self::Audio48Khz96KbitrateMonoMp3 => "audio-48khz-96kbitrate-mono-mp3",
        }
    }

    /// Parse a header value, case-insensitively.
    pub fn from_str_value(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "audio-16khz-32kbitrate-mono-mp3" => Some(Self::Audio16Khz32KbitrateMonoMp3),
            "audio-24khz-48kbitrate-mono-mp3" => Some(Self::Audio24Khz48KbitrateMonoMp3),
            "audio-24khz-96kbitrate-mono-mp3" => Some(Self::Audio24Khz96KbitrateMonoMp3),
            "audio-48khz-96kbitrate-mono-mp3" => Some(Self::Audio48Khz96KbitrateMonoMp3),
            _ => None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        match self {
            Self::Audio16Khz32KbitrateMonoMp3 => 16000,
            Self::Audio24Khz48KbitrateMonoMp3 | Self::Audio24Khz96KbitrateMonoMp3 => 24000,
            Self::Audio48Khz96KbitrateMonoMp3 => 48000,
        }
    }

    pub fn file_extension(&self) -> &'static str {
        "mp3"
    }
}

/// Settings for [`AzureTTS`](super::AzureTTS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureTTSConfig {
    /// Speech resource subscription key
    pub subscription_key: String,
    /// Azure region identifier, e.g. `eastus`
    pub region: String,
    /// Full synthesis URL; derived from `region` when unset
    pub endpoint: Option<String>,
    pub output_format: AzureAudioEncoding,
    /// Directory the synthesized files are written to
    pub audio_dir: PathBuf,
}

impl Default for AzureTTSConfig {
    fn default() -> Self {
        Self {
            subscription_key: String::new(),
            region: "eastus".to_string(),
            endpoint: None,
            output_format: AzureAudioEncoding::default(),
            audio_dir: PathBuf::from("."),
        }
    }
}

impl AzureTTSConfig {
    /// Synthesis endpoint:
    /// `https://{region}.tts.speech.microsoft.com/cognitiveservices/v1`
    pub fn build_tts_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!(
                "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
                self.region
            ),
        }
    }
}

/// Neural voice for a language display name, falling back to [`DEFAULT_VOICE`].
pub fn voice_for_language(language: &str) -> &'static str {
    lookup(language).map_or(DEFAULT_VOICE, |&(_, _, voice)| voice)
}

/// Locale for a language display name, falling back to [`DEFAULT_LOCALE`].
pub fn locale_for_language(language: &str) -> &'static str {
    lookup(language).map_or(DEFAULT_LOCALE, |&(_, locale, _)| locale)
}

fn lookup(language: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    let language = language.trim();
    VOICES.iter().find(|(name, _, _)| *name == language)
}

/// Replace every `<br>`, `<br/>` or `<br />` (any case) with a single space.
pub fn strip_line_breaks(text: &str) -> String {
    LINE_BREAK.replace_all(text, " ").into_owned()
}

/// Escapes special XML characters in text for safe SSML embedding.
pub fn escape_xml(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}

/// Build the SSML body for one synthesis request.
///
/// Line-break markup is turned into spaces before the text is escaped.
pub fn build_ssml(text: &str, voice_name: &str, locale: &str) -> String {
    let spoken = escape_xml(&strip_line_breaks(text));
    format!(
        "<speak version='1.0' xml:lang='{locale}'><voice xml:lang='{locale}' name='{voice_name}'>{spoken}</voice></speak>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_table() {
        assert_eq!(voice_for_language("Arabic"), "ar-SA-HamedNeural");
        assert_eq!(voice_for_language("Mandarin Chinese"), "zh-CN-XiaoxiaoNeural");
        assert_eq!(voice_for_language("Japanese"), "ja-JP-NanamiNeural");
        assert_eq!(voice_for_language("Portuguese (Brazil)"), "pt-BR-ManuelaNeural");
        assert_eq!(voice_for_language("Portuguese"), "pt-BR-FranciscaNeural");
        assert_eq!(voice_for_language("Spanish"), "es-MX-DaliaNeural");
        assert_eq!(voice_for_language("English"), "en-US-JennyNeural");
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        assert_eq!(voice_for_language("Klingon"), DEFAULT_VOICE);
        assert_eq!(locale_for_language("Klingon"), DEFAULT_LOCALE);
        assert_eq!(locale_for_language(""), "en-US");
    }

    #[test]
    fn test_locale_table() {
        assert_eq!(locale_for_language("Spanish"), "es-MX");
        assert_eq!(locale_for_language("Portuguese"), "pt-BR");
        assert_eq!(locale_for_language("Portuguese (Brazil)"), "pt-BR");
        assert_eq!(locale_for_language(" Japanese "), "ja-JP");
    }

    #[test]
    fn test_strip_line_breaks() {
        assert_eq!(
            strip_line_breaks("Gato.<br><br>El gato duerme."),
            "Gato.  El gato duerme."
        );
        assert_eq!(strip_line_breaks("a<BR/>b<br />c<Br  />d"), "a b c d");
        assert_eq!(strip_line_breaks("no breaks"), "no breaks");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("Tom & Jerry"), "Tom &amp; Jerry");
        assert_eq!(escape_xml("<b>'hi'</b>"), "&lt;b&gt;&apos;hi&apos;&lt;/b&gt;");
        assert_eq!(escape_xml("say \"cheese\""), "say &quot;cheese&quot;");
    }

    #[test]
    fn test_build_ssml() {
        let ssml = build_ssml("Gato.<br>El gato & yo", "es-MX-DaliaNeural", "es-MX");
        assert_eq!(
            ssml,
            "<speak version='1.0' xml:lang='es-MX'><voice xml:lang='es-MX' name='es-MX-DaliaNeural'>Gato. El gato &amp; yo</voice></speak>"
        );
    }

    #[test]
    fn test_tts_url() {
        let config = AzureTTSConfig {
            region: "westeurope".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.build_tts_url(),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );

        let config = AzureTTSConfig {
            endpoint: Some("http://127.0.0.1:9000/tts".to_string()),
            ..config
        };
        assert_eq!(config.build_tts_url(), "http://127.0.0.1:9000/tts");
    }

    #[test]
    fn test_encoding_round_trip() {
        let format = AzureAudioEncoding::default();
        assert_eq!(format.as_str(), "audio-24khz-48kbitrate-mono-mp3");
        assert_eq!(format.sample_rate(), 24000);
        assert_eq!(
            AzureAudioEncoding::from_str_value("AUDIO-48KHZ-96KBITRATE-MONO-MP3"),
            Some(AzureAudioEncoding::Audio48Khz96KbitrateMonoMp3)
        );
        assert_eq!(AzureAudioEncoding::from_str_value("raw-pcm"), None);
    }
}
