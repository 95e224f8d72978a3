//! Directory primitives for publication.
//!
//! The swap never deletes the old generation before the new one is in
//! place: the existing target is renamed aside and removed only after
//! the replacement rename succeeds. Readers observe either the old or
//! the new generation in full, never a mix.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PublishError, Result};
use sp_common::RunTimestamp;

/// Create `path` and all missing ancestors. Idempotent.
pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| PublishError::io(path, e))
}

/// Recursively copy `source` into `dest`, creating `dest` if needed.
pub fn copy_dir_recursive(source: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| PublishError::io(dest, e))?;

    let entries = fs::read_dir(source).map_err(|e| PublishError::io(source, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PublishError::io(source, e))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| PublishError::io(&from, e))?;
        if file_type.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| PublishError::io(&from, e))?;
        }
    }
    Ok(())
}

/// Create a recursive backup of `source` as a sibling named `backup_name`.
///
/// Absence of `source` is not an error: there is simply nothing to back
/// up yet, and `Ok(None)` is returned. A prior backup of the same name
/// is replaced.
pub fn backup_directory(source: &Path, backup_name: &str) -> Result<Option<PathBuf>> {
    if !source.exists() {
        return Ok(None);
    }

    let backup_path = match source.parent() {
        Some(parent) => parent.join(backup_name),
        None => PathBuf::from(backup_name),
    };

    if backup_path.exists() {
        fs::remove_dir_all(&backup_path).map_err(|e| PublishError::io(&backup_path, e))?;
    }

    copy_dir_recursive(source, &backup_path)?;
    debug!(backup = %backup_path.display(), "created directory backup");
    Ok(Some(backup_path))
}

/// Outcome of an atomic swap.
#[derive(Debug)]
pub struct SwapOutcome {
    /// Backup of the replaced target, when one was requested and taken.
    pub backup: Option<PathBuf>,
}

/// Atomically replace `target` with the contents of `source`.
///
/// Steps:
/// 1. `source` must exist ([`PublishError::SourceMissing`] otherwise).
/// 2. If `backup_name` is given and `target` exists, a recursive backup
///    of `target` is taken under that sibling name before anything else.
/// 3. `source` is copied to a temporary sibling of `target`; a failure
///    during the copy removes the partial temp and leaves `target`
///    untouched.
/// 4. The existing `target` is renamed aside (not deleted).
/// 5. The temporary directory is renamed to `target`. If this rename
///    fails, the aside directory is renamed back, so the old generation
///    survives every failure point.
/// 6. The aside directory is removed.
pub fn atomic_swap(source: &Path, target: &Path, backup_name: Option<&str>) -> Result<SwapOutcome> {
    if !source.exists() {
        return Err(PublishError::SourceMissing(source.to_path_buf()));
    }

    let target_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| PublishError::InvalidTarget(target.to_path_buf()))?;
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut outcome = SwapOutcome { backup: None };
    if let Some(name) = backup_name {
        if target.exists() {
            outcome.backup = backup_directory(target, name)?;
        }
    }

    let ts = RunTimestamp::now();
    let temp = parent.join(format!("{target_name}_temp_{ts}"));
    let aside = parent.join(format!("{target_name}_old_{ts}"));

    // A killed run can leave a temp directory under the same name.
    if temp.exists() {
        fs::remove_dir_all(&temp).map_err(|e| PublishError::io(&temp, e))?;
    }
    if let Err(e) = copy_dir_recursive(source, &temp) {
        // The temp name is timestamped, so a stranded partial copy
        // would never be reclaimed by a later run.
        let _ = fs::remove_dir_all(&temp);
        return Err(e);
    }

    let had_target = target.exists();
    if had_target {
        if let Err(e) = fs::rename(target, &aside) {
            let _ = fs::remove_dir_all(&temp);
            return Err(PublishError::io(target, e));
        }
    }

    if let Err(e) = fs::rename(&temp, target) {
        if had_target {
            // Put the old generation back before surfacing the error.
            let _ = fs::rename(&aside, target);
        }
        let _ = fs::remove_dir_all(&temp);
        return Err(PublishError::io(target, e));
    }

    if had_target {
        if let Err(e) = fs::remove_dir_all(&aside) {
            warn!(path = %aside.display(), error = %e, "failed to remove replaced generation");
        }
    }

    debug!(
        source = %source.display(),
        target = %target.display(),
        "atomic directory swap complete"
    );
    Ok(outcome)
}
