use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// A synthesized audio file owned by the pipeline for one request.
///
/// The file is deleted when the value is dropped. This also covers results
/// the queue discards because their submitter stopped waiting.
#[derive(Debug)]
pub struct AudioFile {
    path: PathBuf,
}

impl AudioFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Drop a batch of audio files on the blocking pool.
///
/// `Drop` removes each file synchronously; a single stray file is cheap, a
/// whole deck's worth is moved off the runtime worker.
pub async fn release_all(files: Vec<AudioFile>) {
    if files.is_empty() {
        return;
    }
    if let Err(e) = tokio::task::spawn_blocking(move || drop(files)).await {
        warn!("Audio cleanup task failed: {}", e);
    }
}

impl Drop for AudioFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed audio file {}", self.path.display()),
            Err(e) => warn!("Failed to remove audio file {}: {}", self.path.display(), e),
        }
    }
}
