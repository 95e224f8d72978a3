//! Run timestamp identity type.
//!
//! Every pipeline run is identified by a filesystem-safe timestamp of the
//! form `YYYY-MM-DD_HH-MM-SS`. The same string names staging run
//! subdirectories, backup directories (`stable_backup_<ts>`), archive
//! directories, and publication metadata files, so it must stay stable
//! and lexicographically sortable.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// strftime format for run timestamps.
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Timestamp identifying one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunTimestamp(pub String);

impl RunTimestamp {
    /// Current local time in run-timestamp format.
    pub fn now() -> Self {
        RunTimestamp(Local::now().format(RUN_TIMESTAMP_FORMAT).to_string())
    }

    /// Parse and validate a run timestamp string.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(s, RUN_TIMESTAMP_FORMAT).ok()?;
        Some(RunTimestamp(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_canonical_form() {
        let ts = RunTimestamp::parse("2025-01-01_00-00-00").unwrap();
        assert_eq!(ts.as_str(), "2025-01-01_00-00-00");
    }

    #[test]
    fn parse_rejects_other_forms() {
        assert!(RunTimestamp::parse("2025-01-01T00:00:00").is_none());
        assert!(RunTimestamp::parse("2025-01-01").is_none());
        assert!(RunTimestamp::parse("not-a-timestamp").is_none());
    }

    #[test]
    fn now_round_trips() {
        let ts = RunTimestamp::now();
        assert!(RunTimestamp::parse(ts.as_str()).is_some());
    }

    #[test]
    fn serde_is_transparent() {
        let ts = RunTimestamp("2025-01-01_12-30-45".to_string());
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2025-01-01_12-30-45\"");
    }
}
