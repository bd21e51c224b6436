//! Deck packaging: turns cards with audio into importable deck archives.
//!
//! The pipeline only sees the [`DeckPackager`] trait. The shipped
//! implementation, [`ApkgPackager`], writes Anki `.apkg` archives.

mod apkg;
mod schema;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::core::cards::CardWithAudio;

pub use apkg::ApkgPackager;

/// Errors raised while assembling or reading a deck archive
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Deck I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deck database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Deck archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Deck metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Packaging task failed: {0}")]
    Task(String),
}

pub type DeckResult<T> = Result<T, DeckError>;

/// A deck archive written to local storage by a [`DeckPackager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedDeck {
    /// File name presented to the user, e.g. `Animals.apkg`
    pub name: String,
    pub path: PathBuf,
}

/// A deck archive read back into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl DeckFile {
    /// Read a packaged archive into memory and delete the file on disk.
    ///
    /// The file is only removed once it has been read successfully.
    pub async fn take(deck: &PackagedDeck) -> DeckResult<Self> {
        let content = tokio::fs::read(&deck.path).await?;
        tokio::fs::remove_file(&deck.path).await?;
        Ok(Self {
            name: deck.name.clone(),
            content,
        })
    }
}

/// Emits one or two deck archives for a set of cards.
#[async_trait]
pub trait DeckPackager: Send + Sync {
    /// Package `cards` under `deck_name` into `output_dir`.
    ///
    /// Returns the forward deck first, followed by the reversed deck when
    /// `include_reversed` is set. An empty card set still yields a valid deck.
    async fn package(
        &self,
        cards: &[CardWithAudio],
        deck_name: &str,
        include_reversed: bool,
        output_dir: &Path,
    ) -> DeckResult<Vec<PackagedDeck>>;
}

/// Archive file name for a deck: whitespace runs become `_`, path separators
/// are replaced, and `_reversed` is appended for the reversed variant.
pub fn deck_file_name(deck_name: &str, reversed: bool) -> String {
    let mut stem = String::with_capacity(deck_name.len());
    let mut in_whitespace = false;

    for c in deck_name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                stem.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        stem.push(match c {
            '/' | '\\' => '_',
            other => other,
        });
    }

    if stem.is_empty() {
        stem.push_str("deck");
    }
    if reversed {
        stem.push_str("_reversed");
    }
    format!("{stem}.apkg")
}

/// Deck title shown inside the flashcard app for the reversed variant.
pub fn reversed_deck_title(deck_name: &str) -> String {
    format!("{deck_name} (Reversed)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_file_name() {
        assert_eq!(deck_file_name("Animals", false), "Animals.apkg");
        assert_eq!(deck_file_name("My  Spanish\tWords", false), "My_Spanish_Words.apkg");
        assert_eq!(deck_file_name(" Trip ", false), "_Trip_.apkg");
        assert_eq!(deck_file_name("Animals", true), "Animals_reversed.apkg");
    }

    #[test]
    fn test_deck_file_name_strips_path_separators() {
        assert_eq!(deck_file_name("../etc/passwd", false), ".._etc_passwd.apkg");
        assert_eq!(deck_file_name("a\\b", false), "a_b.apkg");
        assert_eq!(deck_file_name("", false), "deck.apkg");
    }

    #[test]
    fn test_reversed_deck_title() {
        assert_eq!(reversed_deck_title("Animals"), "Animals (Reversed)");
    }

    #[tokio::test]
    async fn test_deck_file_take_removes_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Animals.apkg");
        tokio::fs::write(&path, b"PK\x03\x04").await.unwrap();

        let deck = PackagedDeck {
            name: "Animals.apkg".to_string(),
            path: path.clone(),
        };
        let file = DeckFile::take(&deck).await.unwrap();

        assert_eq!(file.name, "Animals.apkg");
        assert_eq!(file.content, b"PK\x03\x04");
        assert!(!path.exists());
    }
}
