//! Publication records: the append-only metadata log of the stable
//! directory.
//!
//! One record is written per successful publish, named by the run
//! timestamp, and is immutable once written. Field names and nesting
//! are a stable contract with the dashboard consumer.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PublishError, Result};
use crate::staging::DatasetDescriptor;

/// File name prefix for publication records inside the stable directory.
pub const RECORD_PREFIX: &str = "_publication_metadata_";

/// Metadata describing one successful publish event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationRecord {
    /// Run timestamp of the publish, also used in the file name.
    pub publication_timestamp: String,
    /// Wall-clock time the record was created.
    pub publication_date: DateTime<Utc>,
    pub datasets_published: Vec<DatasetDescriptor>,
    pub total_records_published: u64,
    pub source_directory: String,
    pub target_directory: String,
    /// Whether the backup policy was in effect for this publish. This
    /// records policy, not outcome: a first publish has nothing to back
    /// up and still reports `true` when the policy is enabled.
    pub backup_created: bool,
    pub publisher: String,
    pub config_version: String,
}

impl PublicationRecord {
    /// File name this record is stored under.
    pub fn file_name(&self) -> String {
        format!("{RECORD_PREFIX}{}.json", self.publication_timestamp)
    }
}

/// Store for publication records inside a stable directory.
#[derive(Debug, Clone)]
pub struct RecordStore {
    stable_dir: PathBuf,
}

impl RecordStore {
    pub fn new(stable_dir: impl Into<PathBuf>) -> Self {
        RecordStore {
            stable_dir: stable_dir.into(),
        }
    }

    /// Persist a record inside the stable directory.
    ///
    /// Written to a temp file then renamed, so a partially written
    /// record is never observable under its final name.
    pub fn write(&self, record: &PublicationRecord) -> Result<PathBuf> {
        let path = self.stable_dir.join(record.file_name());
        let json = serde_json::to_string_pretty(record).map_err(|e| PublishError::Json {
            path: path.clone(),
            source: e,
        })?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| PublishError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| PublishError::io(&path, e))?;
        Ok(path)
    }

    /// All record files in the stable directory, newest first.
    ///
    /// Sorted by file modification time descending (file name as a tie
    /// break). Corrupt or unreadable record files are skipped with a
    /// warning rather than aborting the listing.
    pub fn list(&self) -> Result<Vec<PublicationRecord>> {
        let mut records = Vec::new();
        if !self.stable_dir.exists() {
            return Ok(records);
        }

        let mut files = self.record_files()?;
        files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

        for (path, _) in files {
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable publication record");
                    continue;
                }
            };
            match serde_json::from_str::<PublicationRecord>(&content) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping corrupt publication record");
                }
            }
        }

        Ok(records)
    }

    /// The most recent record, if any.
    pub fn latest(&self) -> Result<Option<PublicationRecord>> {
        Ok(self.list()?.into_iter().next())
    }

    /// Paths of all record files in the stable directory, unordered.
    pub fn record_paths(&self) -> Result<Vec<PathBuf>> {
        Ok(self.record_files()?.into_iter().map(|(p, _)| p).collect())
    }

    fn record_files(&self) -> Result<Vec<(PathBuf, std::time::SystemTime)>> {
        let mut files = Vec::new();
        let entries =
            fs::read_dir(&self.stable_dir).map_err(|e| PublishError::io(&self.stable_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| PublishError::io(&self.stable_dir, e))?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if !path.is_file() || !name.starts_with(RECORD_PREFIX) || !name.ends_with(".json") {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            files.push((path, modified));
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_record(ts: &str) -> PublicationRecord {
        PublicationRecord {
            publication_timestamp: ts.to_string(),
            publication_date: Utc::now(),
            datasets_published: Vec::new(),
            total_records_published: 250,
            source_directory: "staging/cleaned".to_string(),
            target_directory: "cleaned_stable".to_string(),
            backup_created: true,
            publisher: "survey-pipeline-automation".to_string(),
            config_version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn write_then_list_round_trips() {
        let root = tempdir().unwrap();
        let store = RecordStore::new(root.path());
        let record = sample_record("2025-01-01_00-00-00");
        let path = store.write(&record).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "_publication_metadata_2025-01-01_00-00-00.json"
        );

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].publication_timestamp, "2025-01-01_00-00-00");
        assert_eq!(listed[0].total_records_published, 250);
        assert_eq!(listed[0].publisher, "survey-pipeline-automation");
    }

    #[test]
    fn list_is_newest_first() {
        let root = tempdir().unwrap();
        let store = RecordStore::new(root.path());
        store.write(&sample_record("2025-01-01_00-00-00")).unwrap();
        store.write(&sample_record("2025-01-02_00-00-00")).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].publication_timestamp, "2025-01-02_00-00-00");
    }

    #[test]
    fn corrupt_record_is_skipped() {
        let root = tempdir().unwrap();
        let store = RecordStore::new(root.path());
        store.write(&sample_record("2025-01-01_00-00-00")).unwrap();
        fs::write(
            root.path().join("_publication_metadata_garbage.json"),
            "not json",
        )
        .unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn missing_stable_directory_lists_empty() {
        let root = tempdir().unwrap();
        let store = RecordStore::new(root.path().join("absent"));
        assert!(store.list().unwrap().is_empty());
        assert!(store.latest().unwrap().is_none());
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let root = tempdir().unwrap();
        let store = RecordStore::new(root.path());
        fs::write(root.path().join("households.csv"), "id\n1\n").unwrap();
        store.write(&sample_record("2025-01-01_00-00-00")).unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.record_paths().unwrap().len(), 1);
    }
}
