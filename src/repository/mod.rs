//! Paper repository persistence.
//!
//! Normalized records are kept in a single JSON document holding one array
//! of [`PaperRecord`]s. Appending reads the existing collection, extends it
//! in memory, and rewrites the whole file - a deliberate simplicity-over-
//! throughput tradeoff since record counts are in the thousands.
//!
//! The repository enforces identifier uniqueness on append: records whose
//! identifier is already present are skipped and counted, so repeated
//! scrapes of the same venue do not duplicate the collection.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::PaperRecord;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Filesystem read/write failure
    #[error("repository I/O error: {0}")]
    Io(#[from] io::Error),

    /// Records could not be serialized
    #[error("repository serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Trait for paper record stores.
pub trait PaperRepository: Send + Sync {
    /// Appends records, skipping identifiers already present.
    ///
    /// Returns the number of records actually added.
    fn append(&self, records: &[PaperRecord]) -> RepositoryResult<usize>;

    /// Reads the full collection in stored order.
    ///
    /// A missing or malformed backing file is treated as an empty
    /// collection, not an error.
    fn read_all(&self) -> RepositoryResult<Vec<PaperRecord>>;
}

/// JSON-file backed repository.
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    /// Creates a repository over the given file path.
    ///
    /// The file does not need to exist yet; the first append creates it.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PaperRepository for JsonFileRepository {
    fn append(&self, records: &[PaperRecord]) -> RepositoryResult<usize> {
        let mut collection = self.read_all()?;
        let mut known: HashSet<String> = collection
            .iter()
            .map(|r| r.identifier.clone())
            .collect();

        let mut added = 0usize;
        for record in records {
            if known.contains(&record.identifier) {
                debug!(identifier = %record.identifier, "skipping duplicate record");
                continue;
            }
            known.insert(record.identifier.clone());
            collection.push(record.clone());
            added += 1;
        }

        if added > 0 {
            let json = serde_json::to_string_pretty(&collection)?;
            fs::write(&self.path, json)?;
        }
        info!(
            added,
            skipped = records.len() - added,
            total = collection.len(),
            "appended records to repository"
        );
        Ok(added)
    }

    fn read_all(&self) -> RepositoryResult<Vec<PaperRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "repository file missing, treating as empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&contents) {
            Ok(records) => Ok(records),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err,
                      "repository file malformed, treating as empty");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(id: &str, title: &str) -> PaperRecord {
        PaperRecord {
            identifier: id.to_string(),
            title: title.to_string(),
            authors: vec!["First Author".to_string(), "Second Author".to_string()],
            abstract_text: "An abstract.".to_string(),
            url: format!("https://arxiv.org/abs/{id}"),
            venue_name: "ICCV".to_string(),
            venue_year: "2023".to_string(),
        }
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("missing.json"));
        assert!(repo.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_file_reads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        let repo = JsonFileRepository::new(&path);
        assert!(repo.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_records() {
        let dir = tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("papers.json"));

        let records = vec![record("a1", "Paper One"), record("a2", "Paper Two")];
        assert_eq!(repo.append(&records).unwrap(), 2);

        let back = repo.read_all().unwrap();
        assert_eq!(back, records);
        assert_eq!(back[0].authors, vec!["First Author", "Second Author"]);
    }

    #[test]
    fn test_append_extends_in_stored_order() {
        let dir = tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("papers.json"));

        repo.append(&[record("a1", "Paper One")]).unwrap();
        repo.append(&[record("a2", "Paper Two")]).unwrap();

        let back = repo.read_all().unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].identifier, "a1");
        assert_eq!(back[1].identifier, "a2");
    }

    #[test]
    fn test_append_skips_known_identifiers() {
        let dir = tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("papers.json"));

        assert_eq!(repo.append(&[record("a1", "Paper One")]).unwrap(), 1);
        // Same identifier again, plus one new record
        let added = repo
            .append(&[record("a1", "Paper One"), record("a2", "Paper Two")])
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(repo.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_append_dedups_within_one_batch() {
        let dir = tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("papers.json"));

        let added = repo
            .append(&[record("a1", "Paper One"), record("a1", "Paper One")])
            .unwrap();
        assert_eq!(added, 1);
    }
}
