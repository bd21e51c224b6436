//! Flashcard records produced from language-model replies.
//!
//! A [`Card`] is created by the [`parser`] from one line of model output. Once
//! the pipeline has synthesized its audio it becomes a [`CardWithAudio`], which
//! is what the deck packager consumes.

pub mod parser;

use std::path::PathBuf;

use serde::Serialize;

pub use parser::{FIELD_SEPARATOR, ParsedCards, parse_cards};

/// A single flashcard: source-language side on the front, translation on the back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Card {
    /// Unique identifier assigned at parse time (UUID v4)
    #[cfg_attr(
        feature = "openapi",
        schema(example = "7c1f6f3e-8a4b-4a51-9a3c-2f0d8f1f6b2e")
    )]
    pub id: String,
    /// Word plus example sentence in the source language
    #[cfg_attr(
        feature = "openapi",
        schema(example = "Cat.<br><br>The cat sleeps on the sofa.")
    )]
    pub front: String,
    /// Translation plus translated example sentence
    #[cfg_attr(
        feature = "openapi",
        schema(example = "Gato.<br><br>El gato duerme en el sofá.")
    )]
    pub back: String,
}

/// A card whose audio has been synthesized to a file on local storage.
///
/// The audio file is owned by the pipeline from this point on and is removed
/// once the deck archive has been read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CardWithAudio {
    #[serde(flatten)]
    pub card: Card,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub audio_path: PathBuf,
}

impl CardWithAudio {
    pub fn new(card: Card, audio_path: PathBuf) -> Self {
        Self { card, audio_path }
    }

    /// File name of the audio artifact, as referenced from `[sound:...]` tags.
    pub fn audio_file_name(&self) -> String {
        self.audio_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.mp3", self.card.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_file_name_uses_path_basename() {
        let card = Card {
            id: "abc".to_string(),
            front: "Cat".to_string(),
            back: "Gato".to_string(),
        };
        let with_audio = CardWithAudio::new(card, PathBuf::from("/tmp/audio/abc.mp3"));
        assert_eq!(with_audio.audio_file_name(), "abc.mp3");
    }

    #[test]
    fn test_card_with_audio_serializes_flat_camel_case() {
        let card = Card {
            id: "abc".to_string(),
            front: "Cat".to_string(),
            back: "Gato".to_string(),
        };
        let with_audio = CardWithAudio::new(card, PathBuf::from("audio/abc.mp3"));
        let json = serde_json::to_value(&with_audio).unwrap();

        assert_eq!(json["id"], "abc");
        assert_eq!(json["front"], "Cat");
        assert_eq!(json["back"], "Gato");
        assert_eq!(json["audioPath"], "audio/abc.mp3");
    }
}
