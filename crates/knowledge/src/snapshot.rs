//! Corpus snapshots for change detection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tableside_core::{AppError, AppResult};
use walkdir::WalkDir;

/// File name to modification time (milliseconds since the epoch) for every
/// corpus file directly inside the data directory.
///
/// Two snapshots are equal exactly when no corpus file was added, removed or
/// touched between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSnapshot {
    files: BTreeMap<String, i64>,
}

impl CorpusSnapshot {
    /// Capture the current state of `dir`.
    ///
    /// Only files whose lowercase extension is in `extensions` participate.
    /// A missing directory is an empty corpus.
    pub fn capture(dir: &Path, extensions: &[String]) -> AppResult<Self> {
        let mut files = BTreeMap::new();

        if !dir.exists() {
            return Ok(Self { files });
        }

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                AppError::Io(std::io::Error::other(format!(
                    "Failed to read corpus directory {:?}: {}",
                    dir, e
                )))
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let matches = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
                .unwrap_or(false);
            if !matches {
                continue;
            }

            let modified = entry.metadata().map_err(|e| {
                AppError::Io(std::io::Error::other(format!(
                    "Failed to stat {:?}: {}",
                    entry.path(),
                    e
                )))
            })?;
            let millis = modified
                .modified()?
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0);

            files.insert(entry.file_name().to_string_lossy().into_owned(), millis);
        }

        Ok(Self { files })
    }

    /// Corpus file names in sorted order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Full paths of the corpus files, resolved against `dir`, in sorted order.
    pub fn paths(&self, dir: &Path) -> Vec<PathBuf> {
        self.files.keys().map(|name| dir.join(name)).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn extensions() -> Vec<String> {
        ["csv", "xls", "xlsx", "jsonl"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_only_corpus_files_participate() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("menu.csv"), "a").unwrap();
        fs::write(temp.path().join("Sales.XLSX"), "b").unwrap();
        fs::write(temp.path().join("notes.txt"), "c").unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested").join("deep.csv"), "d").unwrap();

        let snapshot = CorpusSnapshot::capture(temp.path(), &extensions()).unwrap();
        let names: Vec<&str> = snapshot.file_names().collect();
        assert_eq!(names, vec!["Sales.XLSX", "menu.csv"]);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let snapshot =
            CorpusSnapshot::capture(&temp.path().join("absent"), &extensions()).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_equality_tracks_changes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("menu.csv");
        fs::write(&path, "Chicken Curry").unwrap();

        let first = CorpusSnapshot::capture(temp.path(), &extensions()).unwrap();
        let again = CorpusSnapshot::capture(temp.path(), &extensions()).unwrap();
        assert_eq!(first, again);

        let later = SystemTime::now() + Duration::from_secs(10);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();
        let touched = CorpusSnapshot::capture(temp.path(), &extensions()).unwrap();
        assert_ne!(first, touched);

        fs::write(temp.path().join("extra.jsonl"), "{}").unwrap();
        let added = CorpusSnapshot::capture(temp.path(), &extensions()).unwrap();
        assert_eq!(added.len(), 2);
        assert_ne!(touched, added);
    }

    #[test]
    fn test_paths_resolve_against_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.csv"), "x").unwrap();
        fs::write(temp.path().join("a.csv"), "y").unwrap();

        let snapshot = CorpusSnapshot::capture(temp.path(), &extensions()).unwrap();
        let paths = snapshot.paths(temp.path());
        assert_eq!(paths[0], temp.path().join("a.csv"));
        assert_eq!(paths[1], temp.path().join("b.csv"));
    }
}
