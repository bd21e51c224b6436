//! Anki `.apkg` writer.
//!
//! An `.apkg` is a zip archive holding a SQLite collection
//! (`collection.anki2`), a `media` JSON index mapping numbered entries to
//! file names, and the media files themselves stored under those numbers.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, params};
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::schema::{self, CollectionIds};
use super::{DeckError, DeckPackager, DeckResult, PackagedDeck, deck_file_name, reversed_deck_title};
use crate::core::cards::CardWithAudio;

/// Separator between note fields in the `flds` column.
const FIELD_SEPARATOR: char = '\x1f';

static NEXT_ID: AtomicI64 = AtomicI64::new(0);

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// One note as it will be stored: the two field values.
#[derive(Debug, Clone)]
struct NoteFields {
    front: String,
    back: String,
}

#[derive(Debug, Clone)]
struct MediaFile {
    name: String,
    path: PathBuf,
}

/// Writes Anki `.apkg` archives with a two-field Basic note type.
///
/// The card back gets an `[sound:...]` tag for its audio; the reversed deck
/// swaps sides so the tag ends up on the front.
#[derive(Debug, Clone, Default)]
pub struct ApkgPackager;

impl ApkgPackager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeckPackager for ApkgPackager {
    async fn package(
        &self,
        cards: &[CardWithAudio],
        deck_name: &str,
        include_reversed: bool,
        output_dir: &Path,
    ) -> DeckResult<Vec<PackagedDeck>> {
        let cards = cards.to_vec();
        let deck_name = deck_name.to_string();
        let output_dir = output_dir.to_path_buf();

        tokio::task::spawn_blocking(move || {
            package_blocking(&cards, &deck_name, include_reversed, &output_dir)
        })
        .await
        .map_err(|e| DeckError::Task(e.to_string()))?
    }
}

fn package_blocking(
    cards: &[CardWithAudio],
    deck_name: &str,
    include_reversed: bool,
    output_dir: &Path,
) -> DeckResult<Vec<PackagedDeck>> {
    let started_at = Instant::now();
    std::fs::create_dir_all(output_dir)?;

    let media: Vec<MediaFile> = cards
        .iter()
        .map(|card| MediaFile {
            name: card.audio_file_name(),
            path: card.audio_path.clone(),
        })
        .collect();

    let forward: Vec<NoteFields> = cards
        .iter()
        .map(|card| NoteFields {
            front: card.card.front.clone(),
            back: with_sound_tag(&card.card.back, &card.audio_file_name()),
        })
        .collect();

    let mut decks = Vec::with_capacity(if include_reversed { 2 } else { 1 });
    decks.push(write_apkg(
        deck_name,
        &forward,
        &media,
        output_dir,
        deck_file_name(deck_name, false),
    )?);

    if include_reversed {
        let reversed: Vec<NoteFields> = forward
            .iter()
            .map(|note| NoteFields {
                front: note.back.clone(),
                back: note.front.clone(),
            })
            .collect();
        decks.push(write_apkg(
            &reversed_deck_title(deck_name),
            &reversed,
            &media,
            output_dir,
            deck_file_name(deck_name, true),
        )?);
    }

    info!(
        "Packaged {} card(s) into {} deck(s) in {}ms",
        cards.len(),
        decks.len(),
        started_at.elapsed().as_millis()
    );
    Ok(decks)
}

fn with_sound_tag(text: &str, audio_file: &str) -> String {
    format!("{text}<br>[sound:{audio_file}]")
}

fn write_apkg(
    deck_title: &str,
    notes: &[NoteFields],
    media: &[MediaFile],
    output_dir: &Path,
    file_name: String,
) -> DeckResult<PackagedDeck> {
    let collection = build_collection(deck_title, notes, output_dir)?;

    let path = output_dir.join(&file_name);
    let mut zip = ZipWriter::new(File::create(&path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("collection.anki2", options)?;
    zip.write_all(&collection)?;

    let mut index = serde_json::Map::with_capacity(media.len());
    for (i, file) in media.iter().enumerate() {
        let entry = i.to_string();
        zip.start_file(entry.as_str(), options)?;
        zip.write_all(&std::fs::read(&file.path)?)?;
        index.insert(entry, serde_json::Value::String(file.name.clone()));
    }

    zip.start_file("media", options)?;
    zip.write_all(serde_json::to_string(&index)?.as_bytes())?;
    zip.finish()?;

    debug!(
        "Wrote {} with {} note(s) and {} media file(s)",
        path.display(),
        notes.len(),
        media.len()
    );

    Ok(PackagedDeck {
        name: file_name,
        path,
    })
}

/// Build the SQLite collection in a scratch file and return its bytes.
fn build_collection(
    deck_title: &str,
    notes: &[NoteFields],
    output_dir: &Path,
) -> DeckResult<Vec<u8>> {
    let db_path = output_dir.join(format!(".{}.anki2", Uuid::new_v4().simple()));
    let result = fill_collection(&db_path, deck_title, notes).and_then(|()| {
        let bytes = std::fs::read(&db_path)?;
        Ok(bytes)
    });
    remove_scratch(&db_path);
    result
}

/// Remove the scratch collection. A failure is logged and otherwise ignored.
fn remove_scratch(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!("Failed to remove scratch collection {}: {}", path.display(), e);
            false
        }
    }
}

fn fill_collection(db_path: &Path, deck_title: &str, notes: &[NoteFields]) -> DeckResult<()> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let now_ms = now.as_millis() as i64;
    let id_base = allocate_ids(now_ms, 2 + 2 * notes.len() as i64);
    let ids = CollectionIds {
        model_id: id_base,
        deck_id: id_base + 1,
        now_secs: now.as_secs() as i64,
    };

    let mut conn = Connection::open(db_path)?;
    conn.execute_batch(schema::CREATE_SCHEMA)?;

    let tx = conn.transaction()?;
    tx.execute(
        schema::INSERT_COLLECTION,
        params![
            ids.now_secs,
            now_ms,
            schema::COLLECTION_VERSION,
            schema::conf_json(&ids).to_string(),
            schema::models_json(&ids).to_string(),
            schema::decks_json(&ids, deck_title).to_string(),
            schema::dconf_json().to_string(),
        ],
    )?;

    {
        let mut insert_note = tx.prepare(schema::INSERT_NOTE)?;
        let mut insert_card = tx.prepare(schema::INSERT_CARD)?;

        for (position, note) in notes.iter().enumerate() {
            let note_id = id_base + 2 + position as i64;
            let card_id = id_base + 2 + (notes.len() + position) as i64;
            let sort_field = strip_html(&note.front);
            let flds = format!("{}{FIELD_SEPARATOR}{}", note.front, note.back);

            insert_note.execute(params![
                note_id,
                Uuid::new_v4().simple().to_string(),
                ids.model_id,
                ids.now_secs,
                flds,
                sort_field,
                field_checksum(&sort_field),
            ])?;
            insert_card.execute(params![
                card_id,
                note_id,
                ids.deck_id,
                ids.now_secs,
                position as i64,
            ])?;
        }
    }

    tx.commit()?;
    conn.close().map_err(|(_, e)| DeckError::Database(e))?;
    Ok(())
}

/// Reserve `count` consecutive ids starting at or after `now_ms`, never
/// reusing a range handed out earlier in this process.
fn allocate_ids(now_ms: i64, count: i64) -> i64 {
    let mut current = NEXT_ID.load(Ordering::Relaxed);
    loop {
        let base = now_ms.max(current);
        match NEXT_ID.compare_exchange_weak(current, base + count, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return base,
            Err(actual) => current = actual,
        }
    }
}

fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").trim().to_string()
}

/// First 8 hex digits of the SHA-1 of the sort field, as Anki computes `csum`.
fn field_checksum(text: &str) -> i64 {
    let digest = Sha1::digest(text.as_bytes());
    i64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}
