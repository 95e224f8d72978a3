//! Configuration loading and validation for the survey pipeline.
//!
//! This crate provides:
//! - Typed configuration structures for `pipeline.json`
//! - Deterministic config resolution (CLI > env > project file > defaults)
//! - Semantic validation, fail-fast at load time
//! - Config snapshots (path + content hash) for publication audit
//!
//! Every component receives a fully validated [`PipelineConfig`] at
//! construction; nothing reads ambient process state or re-resolves
//! keys with scattered fallbacks.

pub mod resolve;
pub mod settings;

pub use resolve::{ConfigResolution, ConfigResolver, ConfigSnapshot};
pub use settings::{PipelineConfig, PublishSettings, StagingLayout};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
