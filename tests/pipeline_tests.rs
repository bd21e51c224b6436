//! End-to-end card generation with a scripted model, a file-writing
//! synthesizer and the real Anki packager.

mod common;

use std::io::{Cursor, Read};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tempfile::TempDir;
use zip::ZipArchive;

use common::{FileSynthesizer, ScriptedModel, SynthesisMode, entry_count, pipeline};
use quickcards::core::pipeline::{CardRequest, InputRequest, PipelineError};

const CAT_DOG_REPLY: &str = "Cat.<br><br>The cat sleeps.;Gato.<br><br>El gato duerme.\n\
                             Dog.<br><br>The dog runs.;Perro.<br><br>El perro corre.";

fn request(words: &str, include_reversed: bool) -> CardRequest {
    CardRequest {
        deck_name: "My Animals".to_string(),
        words: words.to_string(),
        source_language: "English".to_string(),
        target_language: "Spanish".to_string(),
        include_reversed,
    }
}

fn archive_entries(content: &str) -> Vec<String> {
    let bytes = BASE64.decode(content).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

fn media_index(content: &str) -> serde_json::Value {
    let bytes = BASE64.decode(content).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut media = String::new();
    archive
        .by_name("media")
        .unwrap()
        .read_to_string(&mut media)
        .unwrap();
    serde_json::from_str(&media).unwrap()
}

#[tokio::test]
async fn test_generate_two_cards_with_audio_and_deck() {
    let work = TempDir::new().unwrap();
    let audio_dir = work.path().join("audio");
    let decks_dir = work.path().join("decks");

    let model = Arc::new(ScriptedModel::replying(CAT_DOG_REPLY));
    let synthesizer = Arc::new(FileSynthesizer::new(&audio_dir, SynthesisMode::Succeed));
    let pipeline = pipeline(model.clone(), synthesizer.clone(), &decks_dir);

    let deck = pipeline.generate(&request("cat\n\n dog \n", false)).await.unwrap();

    assert_eq!(deck.message, "Successfully generated 2 flashcards");
    assert_eq!(deck.cards.len(), 2);
    assert_eq!(deck.cards[0].card.front, "Cat.<br><br>The cat sleeps.");
    assert_eq!(deck.cards[1].card.back, "Perro.<br><br>El perro corre.");

    // One synthesis per card, in card order, speaking the back in the target language
    let calls = synthesizer.calls.lock().clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, deck.cards[0].card.back);
    assert_eq!(calls[0].1, deck.cards[0].card.id);
    assert_eq!(calls[1].1, deck.cards[1].card.id);
    assert!(calls.iter().all(|(_, _, language)| language == "Spanish"));

    // The model saw both words and the generation budget
    let prompts = model.prompts.lock().clone();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].0.contains("Here are the words to process:\ncat\ndog\n"));
    assert_eq!(prompts[0].1.max_tokens, 2048);

    assert_eq!(deck.deck_files.len(), 1);
    assert_eq!(deck.deck_files[0].name, "My_Animals.apkg");
    let entries = archive_entries(&deck.deck_files[0].content);
    assert_eq!(entries, vec!["0", "1", "collection.anki2", "media"]);

    let media = media_index(&deck.deck_files[0].content);
    assert_eq!(media["0"], format!("{}.mp3", deck.cards[0].card.id));
    assert_eq!(media["1"], format!("{}.mp3", deck.cards[1].card.id));

    // Transient files are gone
    assert!(deck.cards.iter().all(|card| !card.audio_path.exists()));
    assert_eq!(entry_count(&audio_dir), 0);
    assert_eq!(entry_count(&decks_dir), 0);
}

#[tokio::test]
async fn test_generate_with_reversed_deck() {
    let work = TempDir::new().unwrap();
    let audio_dir = work.path().join("audio");
    let decks_dir = work.path().join("decks");

    let model = Arc::new(ScriptedModel::replying(CAT_DOG_REPLY));
    let synthesizer = Arc::new(FileSynthesizer::new(&audio_dir, SynthesisMode::Succeed));
    let pipeline = pipeline(model, synthesizer.clone(), &decks_dir);

    let deck = pipeline.generate(&request("cat\ndog", true)).await.unwrap();

    assert_eq!(deck.cards.len(), 2);
    let names: Vec<&str> = deck.deck_files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["My_Animals.apkg", "My_Animals_reversed.apkg"]);

    // Audio is synthesized once and embedded in both decks
    assert_eq!(synthesizer.call_count(), 2);
    for file in &deck.deck_files {
        assert!(archive_entries(&file.content).contains(&"collection.anki2".to_string()));
        assert_eq!(media_index(&file.content).as_object().unwrap().len(), 2);
    }

    assert_eq!(entry_count(&audio_dir), 0);
    assert_eq!(entry_count(&decks_dir), 0);
}

#[tokio::test]
async fn test_generate_with_no_cards_still_builds_deck() {
    let work = TempDir::new().unwrap();
    let audio_dir = work.path().join("audio");
    let decks_dir = work.path().join("decks");

    let model = Arc::new(ScriptedModel::replying("There were no words to translate."));
    let synthesizer = Arc::new(FileSynthesizer::new(&audio_dir, SynthesisMode::Succeed));
    let pipeline = pipeline(model, synthesizer.clone(), &decks_dir);

    let deck = pipeline.generate(&request("", false)).await.unwrap();

    assert_eq!(deck.message, "Successfully generated 0 flashcards");
    assert!(deck.cards.is_empty());
    assert_eq!(synthesizer.call_count(), 0);
    assert_eq!(deck.deck_files.len(), 1);
    assert_eq!(
        archive_entries(&deck.deck_files[0].content),
        vec!["collection.anki2", "media"]
    );
    assert_eq!(media_index(&deck.deck_files[0].content), serde_json::json!({}));
}

#[tokio::test]
async fn test_rate_limited_synthesis_returns_no_deck() {
    let work = TempDir::new().unwrap();
    let audio_dir = work.path().join("audio");
    let decks_dir = work.path().join("decks");

    let model = Arc::new(ScriptedModel::replying(CAT_DOG_REPLY));
    let synthesizer = Arc::new(FileSynthesizer::new(
        &audio_dir,
        SynthesisMode::AlwaysRateLimited,
    ));
    let pipeline = pipeline(model, synthesizer.clone(), &decks_dir);

    let err = pipeline.generate(&request("cat\ndog", true)).await.unwrap_err();

    assert!(matches!(err, PipelineError::RateLimitExceeded(_)));
    // First card: one attempt plus two retries
    assert!(synthesizer.call_count() >= 3);
    assert_eq!(entry_count(&decks_dir), 0);
    assert_eq!(entry_count(&audio_dir), 0);
}

#[tokio::test]
async fn test_synthesis_failure_removes_produced_audio() {
    let work = TempDir::new().unwrap();
    let audio_dir = work.path().join("audio");
    let decks_dir = work.path().join("decks");

    let model = Arc::new(ScriptedModel::replying(CAT_DOG_REPLY));
    let synthesizer = Arc::new(FileSynthesizer::new(&audio_dir, SynthesisMode::FailAfter(1)));
    let pipeline = pipeline(model, synthesizer.clone(), &decks_dir);

    let err = pipeline.generate(&request("cat\ndog", false)).await.unwrap_err();

    assert!(matches!(err, PipelineError::Synthesis(_)));
    assert_eq!(synthesizer.call_count(), 2);
    assert_eq!(entry_count(&audio_dir), 0);
    assert_eq!(entry_count(&decks_dir), 0);
}

#[tokio::test]
async fn test_model_failure_is_upstream_error() {
    let work = TempDir::new().unwrap();
    let model = Arc::new(ScriptedModel::failing(500));
    let synthesizer = Arc::new(FileSynthesizer::new(
        &work.path().join("audio"),
        SynthesisMode::Succeed,
    ));
    let pipeline = pipeline(model, synthesizer.clone(), &work.path().join("decks"));

    let err = pipeline.generate(&request("cat", false)).await.unwrap_err();

    assert!(matches!(err, PipelineError::UpstreamModel(_)));
    assert_eq!(synthesizer.call_count(), 0);
}

#[tokio::test]
async fn test_preview_is_stable_for_deterministic_model() {
    let work = TempDir::new().unwrap();
    let model = Arc::new(ScriptedModel::replying(CAT_DOG_REPLY));
    let synthesizer = Arc::new(FileSynthesizer::new(
        &work.path().join("audio"),
        SynthesisMode::Succeed,
    ));
    let pipeline = pipeline(model.clone(), synthesizer.clone(), &work.path().join("decks"));

    let input = InputRequest {
        input: "\ncat\ndog".to_string(),
        source_language: "English".to_string(),
        target_language: "Spanish".to_string(),
    };

    let first = pipeline.preview(&input).await.unwrap().unwrap();
    let second = pipeline.preview(&input).await.unwrap().unwrap();

    assert_eq!(first.front, second.front);
    assert_eq!(first.back, second.back);
    assert_eq!(first.front, "Cat.<br><br>The cat sleeps.");

    // Only the first line reaches the model, and nothing is synthesized
    let prompts = model.prompts.lock().clone();
    assert!(prompts[0].0.contains("Here are the words to process:\ncat\n\nReturn only"));
    assert_eq!(synthesizer.call_count(), 0);
}
