//! Staging area inspection and validation.
//!
//! Datasets are discovered directly under the staging root; when none
//! are found there, one level of timestamped run subdirectories is
//! searched. The scan has partial-failure semantics: one corrupt file
//! records an issue but does not hide problems in the remaining files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One tabular dataset found during a scan.
///
/// Recomputed on every validation pass; never persisted on its own,
/// only embedded in publication records. Field names are part of the
/// metadata contract with the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// File name, which doubles as the logical dataset name.
    pub file: String,
    /// Source file path at scan time.
    pub path: PathBuf,
    /// Data row count (excluding the header).
    pub records: u64,
    /// Column count from the header row.
    pub columns: u64,
    /// File modification time.
    pub last_modified: DateTime<Utc>,
}

/// Result of validating a staging area.
#[derive(Debug, Clone, Serialize)]
pub struct StagingReport {
    pub valid: bool,
    pub issues: Vec<String>,
    pub datasets_found: Vec<DatasetDescriptor>,
    pub total_records: u64,
}

impl StagingReport {
    /// Report for a skipped validation (force mode).
    pub fn skipped() -> Self {
        StagingReport {
            valid: true,
            issues: Vec::new(),
            datasets_found: Vec::new(),
            total_records: 0,
        }
    }
}

/// Validate that staging data is ready for publication.
///
/// Returns `valid = false` if no CSV files are found, no records exist
/// across all datasets, or any file fails to parse. Zero-row datasets
/// are flagged as issues without invalidating the report on their own.
pub fn validate_staging(staging_root: &Path) -> StagingReport {
    let mut report = StagingReport {
        valid: true,
        issues: Vec::new(),
        datasets_found: Vec::new(),
        total_records: 0,
    };

    if !staging_root.exists() {
        report.valid = false;
        report
            .issues
            .push(format!("no staging directory found at {}", staging_root.display()));
        return report;
    }

    let csv_files = match discover_csv_files(staging_root) {
        Ok(files) => files,
        Err(e) => {
            report.valid = false;
            report
                .issues
                .push(format!("failed to scan {}: {e}", staging_root.display()));
            return report;
        }
    };

    if csv_files.is_empty() {
        report.valid = false;
        report.issues.push(format!(
            "no CSV files found in {} or its subdirectories",
            staging_root.display()
        ));
        return report;
    }

    for path in csv_files {
        match inspect_dataset(&path) {
            Ok(dataset) => {
                debug!(file = %dataset.file, records = dataset.records, "found dataset");
                if dataset.records == 0 {
                    report.issues.push(format!("dataset {} is empty", dataset.file));
                }
                report.total_records += dataset.records;
                report.datasets_found.push(dataset);
            }
            Err(issue) => {
                report.valid = false;
                report.issues.push(issue);
            }
        }
    }

    if report.total_records == 0 {
        report.valid = false;
        report
            .issues
            .push("no data records found across all datasets".to_string());
    }

    report
}

/// Inventory the datasets directly inside a directory.
///
/// Unreadable files are skipped with a warning; used for live status
/// reporting of the stable directory, where one bad file should not
/// hide the rest.
pub fn inventory(dir: &Path) -> Vec<DatasetDescriptor> {
    let mut datasets = Vec::new();
    let files = match list_csv_files(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to list datasets");
            return datasets;
        }
    };
    for path in files {
        match inspect_dataset(&path) {
            Ok(dataset) => datasets.push(dataset),
            Err(issue) => warn!(%issue, "skipping unreadable dataset"),
        }
    }
    datasets
}

/// CSV files directly under `staging_root`, falling back to one level
/// of run subdirectories when none are found directly.
fn discover_csv_files(staging_root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let direct = list_csv_files(staging_root)?;
    if !direct.is_empty() {
        return Ok(direct);
    }

    let mut nested = Vec::new();
    for entry in fs::read_dir(staging_root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            nested.extend(list_csv_files(&entry.path())?);
        }
    }
    Ok(nested)
}

fn list_csv_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("csv") {
            files.push(path);
        }
    }
    // Deterministic scan order regardless of directory iteration order.
    files.sort();
    Ok(files)
}

fn inspect_dataset(path: &Path) -> std::result::Result<DatasetDescriptor, String> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| format!("error reading {file_name}: {e}"))?;

    let columns = reader
        .headers()
        .map_err(|e| format!("error reading {file_name}: {e}"))?
        .len() as u64;

    let mut records = 0u64;
    for row in reader.records() {
        row.map_err(|e| format!("error reading {file_name}: {e}"))?;
        records += 1;
    }

    let metadata = fs::metadata(path).map_err(|e| format!("error reading {file_name}: {e}"))?;
    let last_modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .map_err(|e| format!("error reading {file_name}: {e}"))?;

    Ok(DatasetDescriptor {
        file: file_name,
        path: path.to_path_buf(),
        records,
        columns,
        last_modified,
    })
}
