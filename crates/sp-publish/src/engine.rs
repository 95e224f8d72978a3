//! Publishing engine: validate, back up, swap, record, archive; plus
//! rollback through the same swap primitive.
//!
//! A publish walks a fixed sequence of stages. No filesystem mutation
//! happens before validation passes (or is forced), the previous stable
//! generation is backed up before any destructive step, and the
//! publication record is written only after the swap completes so it
//! always references the new generation. Archiving failures are logged
//! and never invalidate a successful publish.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use sp_common::RunTimestamp;
use sp_config::PipelineConfig;

use crate::error::{PublishError, Result};
use crate::fsops;
use crate::lock::{PublishLock, LOCK_FILE_NAME};
use crate::record::{PublicationRecord, RecordStore};
use crate::staging::{self, DatasetDescriptor, StagingReport};

/// Prefix for pre-publish backups of the stable directory.
pub const STABLE_BACKUP_PREFIX: &str = "stable_backup_";

/// Prefix for pre-rollback snapshots of the stable directory.
pub const PRE_ROLLBACK_PREFIX: &str = "pre_rollback_";

/// Result of a successful publish.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReceipt {
    pub run_timestamp: RunTimestamp,
    pub record: PublicationRecord,
    /// Backup of the replaced generation, if one was taken.
    pub backup_path: Option<PathBuf>,
    pub datasets_published: usize,
    pub total_records: u64,
}

/// Result of a successful rollback.
#[derive(Debug, Clone, Serialize)]
pub struct RollbackReceipt {
    pub restored_from: PathBuf,
    /// Snapshot of the stable state taken just before restoring.
    pub current_backup: Option<PathBuf>,
    pub rollback_timestamp: RunTimestamp,
}

/// Current publication state, recomputed live on every call.
#[derive(Debug, Clone, Serialize)]
pub struct PublicationStatus {
    pub stable_directory_exists: bool,
    pub stable_directory_path: String,
    pub staging_ready: bool,
    pub staging_path: String,
    pub last_publication: Option<PublicationRecord>,
    pub current_datasets: Vec<DatasetDescriptor>,
    pub total_records: u64,
    /// Backups are retained indefinitely; operators prune by hand.
    pub backups_available: usize,
}

/// Engine for atomically publishing cleaned data to the stable directory.
#[derive(Debug)]
pub struct PublishEngine {
    config: PipelineConfig,
    project_root: PathBuf,
    staging_cleaned: PathBuf,
    stable_path: PathBuf,
}

impl PublishEngine {
    /// Build an engine from an explicit configuration and project root.
    pub fn new(config: PipelineConfig, project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let staging_cleaned = project_root.join(&config.staging.cleaned_dir);
        let stable_path = project_root.join(&config.publish.stable_directory);
        PublishEngine {
            config,
            project_root,
            staging_cleaned,
            stable_path,
        }
    }

    pub fn stable_path(&self) -> &Path {
        &self.stable_path
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging_cleaned
    }

    fn lock_path(&self) -> PathBuf {
        self.project_root.join(LOCK_FILE_NAME)
    }

    /// Validate that staging data is ready for publication.
    pub fn validate_staging(&self) -> StagingReport {
        staging::validate_staging(&self.staging_cleaned)
    }

    /// Atomically publish staged data to the stable directory.
    ///
    /// `force` bypasses validation entirely; it is the documented escape
    /// hatch for operator-driven emergency publishes, and with an empty
    /// staging area it produces an empty stable directory.
    pub fn publish(&self, run_timestamp: &RunTimestamp, force: bool) -> Result<PublishReceipt> {
        let _lock = PublishLock::acquire(&self.lock_path())?;
        info!(run = %run_timestamp, force, "starting data publication");

        // Validating: no filesystem mutation happens before this passes.
        let report = if force {
            warn!("force mode enabled, skipping staging validation");
            StagingReport::skipped()
        } else {
            let report = self.validate_staging();
            if !report.valid {
                return Err(PublishError::StagingNotReady {
                    issues: report.issues,
                });
            }
            report
        };

        // Backing up: absence of prior stable data is a first publish,
        // not an error.
        let backup_path = if self.config.publish.backup_previous {
            fsops::backup_directory(
                &self.stable_path,
                &format!("{STABLE_BACKUP_PREFIX}{run_timestamp}"),
            )?
        } else {
            None
        };

        // Preparing: the swap always operates on a single flat source.
        let prepared = self.prepare_source(&report)?;

        // Publication records from past generations live alongside the
        // datasets and must survive the swap that replaces them.
        let prior_records = self.read_prior_records()?;

        // Swapping.
        fsops::atomic_swap(&prepared, &self.stable_path, None)?;

        // Writing metadata: after the swap, so the record references the
        // new generation it describes.
        self.restore_prior_records(&prior_records)?;
        let record = PublicationRecord {
            publication_timestamp: run_timestamp.to_string(),
            publication_date: Utc::now(),
            datasets_published: report.datasets_found.clone(),
            total_records_published: report.total_records,
            source_directory: self.staging_cleaned.display().to_string(),
            target_directory: self.stable_path.display().to_string(),
            backup_created: self.config.publish.backup_previous,
            publisher: self.config.publish.publisher.clone(),
            config_version: self.config.version.clone(),
        };
        let store = RecordStore::new(&self.stable_path);
        store.write(&record)?;

        // Archiving: non-fatal; a failed archive does not roll back a
        // successful publish.
        if let Err(err) = self.archive_staging(run_timestamp, &prepared) {
            warn!(error = %err, "failed to archive staging data");
        }

        info!(
            datasets = report.datasets_found.len(),
            records = report.total_records,
            "data published to stable directory"
        );

        Ok(PublishReceipt {
            run_timestamp: run_timestamp.clone(),
            datasets_published: record.datasets_published.len(),
            total_records: record.total_records_published,
            backup_path,
            record,
        })
    }

    /// Restore a previous backup as the new stable state.
    ///
    /// The rollback goes through the same swap primitive as forward
    /// publishing and snapshots the current stable state first, so a
    /// rollback is itself reversible.
    pub fn rollback(&self, backup_timestamp: &str) -> Result<RollbackReceipt> {
        let _lock = PublishLock::acquire(&self.lock_path())?;
        info!(backup = backup_timestamp, "starting rollback");

        let backup_name = format!("{STABLE_BACKUP_PREFIX}{backup_timestamp}");
        let backup_path = find_directory(&self.project_root, &backup_name)?.ok_or_else(|| {
            PublishError::BackupNotFound {
                timestamp: backup_timestamp.to_string(),
            }
        })?;

        let now = RunTimestamp::now();
        let current_backup = fsops::backup_directory(
            &self.stable_path,
            &format!("{PRE_ROLLBACK_PREFIX}{now}"),
        )?;

        fsops::atomic_swap(&backup_path, &self.stable_path, None)?;

        info!(restored_from = %backup_path.display(), "rollback complete");
        Ok(RollbackReceipt {
            restored_from: backup_path,
            current_backup,
            rollback_timestamp: now,
        })
    }

    /// Current publication status, recomputed live rather than cached.
    pub fn status(&self) -> Result<PublicationStatus> {
        let store = RecordStore::new(&self.stable_path);
        let last_publication = store.latest()?;

        let current_datasets = if self.stable_path.exists() {
            staging::inventory(&self.stable_path)
        } else {
            Vec::new()
        };
        let total_records = current_datasets.iter().map(|d| d.records).sum();

        Ok(PublicationStatus {
            stable_directory_exists: self.stable_path.exists(),
            stable_directory_path: self.stable_path.display().to_string(),
            staging_ready: self.staging_cleaned.exists(),
            staging_path: self.staging_cleaned.display().to_string(),
            last_publication,
            current_datasets,
            total_records,
            backups_available: self.count_backups()?,
        })
    }

    /// All publication records, newest first.
    pub fn list_publications(&self) -> Result<Vec<PublicationRecord>> {
        RecordStore::new(&self.stable_path).list()
    }

    /// Consolidate discovered datasets into one flat source directory.
    ///
    /// Datasets already sitting directly in the staging root are used in
    /// place; datasets scattered across run subdirectories are copied
    /// into the consolidated scratch directory, decoupling the swap from
    /// staging's internal layout.
    fn prepare_source(&self, report: &StagingReport) -> Result<PathBuf> {
        let all_direct = report
            .datasets_found
            .iter()
            .all(|d| d.path.parent() == Some(self.staging_cleaned.as_path()));
        if all_direct {
            return Ok(self.staging_cleaned.clone());
        }

        let consolidated = self.project_root.join(&self.config.staging.consolidated_dir);
        fsops::ensure_directory(&consolidated)?;

        // Clear leftovers from a previous run.
        let entries = fs::read_dir(&consolidated).map_err(|e| PublishError::io(&consolidated, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| PublishError::io(&consolidated, e))?;
            let path = entry.path();
            if path.is_file() {
                fs::remove_file(&path).map_err(|e| PublishError::io(&path, e))?;
            }
        }

        for dataset in &report.datasets_found {
            let target = consolidated.join(&dataset.file);
            fs::copy(&dataset.path, &target).map_err(|e| PublishError::io(&dataset.path, e))?;
            info!(file = %dataset.file, "consolidated dataset for publication");
        }

        Ok(consolidated)
    }

    fn consolidated_path(&self) -> PathBuf {
        self.project_root.join(&self.config.staging.consolidated_dir)
    }

    /// Move consumed staging content into a timestamped archive, leaving
    /// an empty staging directory ready for the next run.
    fn archive_staging(&self, run_timestamp: &RunTimestamp, prepared: &Path) -> Result<()> {
        let archive_root = self
            .project_root
            .join(&self.config.staging.archive_dir)
            .join(run_timestamp.as_str());
        if let Some(parent) = archive_root.parent() {
            fsops::ensure_directory(parent)?;
        }

        if prepared == self.consolidated_path() {
            // The consolidated copy was published; archive the original
            // run subdirectories and drop the scratch copy.
            fsops::ensure_directory(&archive_root)?;
            let entries = fs::read_dir(&self.staging_cleaned)
                .map_err(|e| PublishError::io(&self.staging_cleaned, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| PublishError::io(&self.staging_cleaned, e))?;
                let path = entry.path();
                if path.is_dir() {
                    let target = archive_root.join(entry.file_name());
                    fs::rename(&path, &target).map_err(|e| PublishError::io(&path, e))?;
                    info!(archived = %target.display(), "archived staging data");
                }
            }
            fs::remove_dir_all(prepared).map_err(|e| PublishError::io(prepared, e))?;
        } else if self.staging_cleaned.exists() {
            fs::rename(&self.staging_cleaned, &archive_root)
                .map_err(|e| PublishError::io(&self.staging_cleaned, e))?;
            info!(archived = %archive_root.display(), "archived staging data");
        }

        // Leave staging ready for the next run.
        fsops::ensure_directory(&self.staging_cleaned)?;
        Ok(())
    }

    fn read_prior_records(&self) -> Result<Vec<(String, String)>> {
        let mut records = Vec::new();
        if !self.stable_path.exists() {
            return Ok(records);
        }
        let store = RecordStore::new(&self.stable_path);
        let mut paths = store.record_paths()?;
        // Oldest first, so restored mtimes keep the listing order.
        paths.sort();
        for path in paths {
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            let content = fs::read_to_string(&path).map_err(|e| PublishError::io(&path, e))?;
            records.push((name, content));
        }
        Ok(records)
    }

    fn restore_prior_records(&self, records: &[(String, String)]) -> Result<()> {
        for (name, content) in records {
            let path = self.stable_path.join(name);
            fs::write(&path, content).map_err(|e| PublishError::io(&path, e))?;
        }
        Ok(())
    }

    fn count_backups(&self) -> Result<usize> {
        let mut count = 0;
        let entries =
            fs::read_dir(&self.project_root).map_err(|e| PublishError::io(&self.project_root, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| PublishError::io(&self.project_root, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().is_dir()
                && (name.starts_with(STABLE_BACKUP_PREFIX) || name.starts_with(PRE_ROLLBACK_PREFIX))
            {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Find a directory with the given name anywhere under `root`.
fn find_directory(root: &Path, name: &str) -> Result<Option<PathBuf>> {
    // Common case first: backups are siblings of the stable directory.
    let direct = root.join(name);
    if direct.is_dir() {
        return Ok(Some(direct));
    }

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => return Err(PublishError::io(root, e)),
    };
    for entry in entries {
        let entry = entry.map_err(|e| PublishError::io(root, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy() == name {
            return Ok(Some(path));
        }
        if let Some(found) = find_directory(&path, name)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
