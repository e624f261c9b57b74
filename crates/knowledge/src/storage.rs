//! On-disk persistence of the current generation.

use crate::generation::IndexGeneration;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tableside_core::{AppError, AppResult};
use tempfile::NamedTempFile;

const GENERATION_FILE: &str = "generation.json";

/// Stores one generation as `generation.json` inside the storage directory.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a crash mid-write leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct GenerationStore {
    dir: PathBuf,
}

impl GenerationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(GENERATION_FILE)
    }

    /// Replace the stored generation.
    pub fn save(&self, generation: &IndexGeneration) -> AppResult<()> {
        fs::create_dir_all(&self.dir)?;

        let mut file = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut file, generation)?;
        file.flush()?;
        file.persist(self.path())
            .map_err(|e| AppError::Io(e.error))?;

        tracing::debug!(
            generation = generation.id,
            path = %self.path().display(),
            "Persisted index generation"
        );
        Ok(())
    }

    /// Load the stored generation, if any.
    pub fn load(&self) -> AppResult<Option<IndexGeneration>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read(&path)?;
        let generation = serde_json::from_slice(&raw)?;
        Ok(Some(generation))
    }
}
