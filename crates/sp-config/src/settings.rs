//! Typed configuration structures.
//!
//! Defaults match the documented configuration surface: a missing or
//! empty `pipeline.json` yields a fully working configuration.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Configuration schema version, recorded in publication metadata.
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub publish: PublishSettings,

    #[serde(default)]
    pub staging: StagingLayout,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            version: default_version(),
            publish: PublishSettings::default(),
            staging: StagingLayout::default(),
        }
    }
}

/// Publication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSettings {
    /// Name of the stable directory under the project root.
    #[serde(default = "default_stable_directory")]
    pub stable_directory: String,

    /// Back up the previous stable generation before each swap.
    #[serde(default = "default_backup_previous")]
    pub backup_previous: bool,

    /// Publisher identity recorded in publication metadata.
    #[serde(default = "default_publisher")]
    pub publisher: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        PublishSettings {
            stable_directory: default_stable_directory(),
            backup_previous: default_backup_previous(),
            publisher: default_publisher(),
        }
    }
}

/// Staging area layout, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingLayout {
    /// Where cleaned datasets land before publication.
    #[serde(default = "default_cleaned_dir")]
    pub cleaned_dir: String,

    /// Where consumed staging content is archived after a publish.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,

    /// Scratch directory used to flatten scattered run subdirectories.
    #[serde(default = "default_consolidated_dir")]
    pub consolidated_dir: String,
}

impl Default for StagingLayout {
    fn default() -> Self {
        StagingLayout {
            cleaned_dir: default_cleaned_dir(),
            archive_dir: default_archive_dir(),
            consolidated_dir: default_consolidated_dir(),
        }
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_stable_directory() -> String {
    "cleaned_stable".to_string()
}

fn default_backup_previous() -> bool {
    true
}

fn default_publisher() -> String {
    "survey-pipeline-automation".to_string()
}

fn default_cleaned_dir() -> String {
    "staging/cleaned".to_string()
}

fn default_archive_dir() -> String {
    "staging/published_archive".to_string()
}

fn default_consolidated_dir() -> String {
    "staging/cleaned_consolidated".to_string()
}

impl PipelineConfig {
    /// Validate configuration semantically.
    pub fn validate(&self) -> Result<()> {
        // Backups are created as siblings of the stable directory, so the
        // stable directory must be a single path component under the root.
        validate_single_component("publish.stable_directory", &self.publish.stable_directory)?;

        if self.publish.publisher.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "publish.publisher must not be empty".to_string(),
            ));
        }

        validate_relative_path("staging.cleaned_dir", &self.staging.cleaned_dir)?;
        validate_relative_path("staging.archive_dir", &self.staging.archive_dir)?;
        validate_relative_path("staging.consolidated_dir", &self.staging.consolidated_dir)?;

        Ok(())
    }
}

fn validate_single_component(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
        return Err(ConfigError::Invalid(format!(
            "{field} must be a single directory name, got '{value}'"
        )));
    }
    Ok(())
}

fn validate_relative_path(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    let path = std::path::Path::new(value);
    if path.is_absolute() {
        return Err(ConfigError::Invalid(format!(
            "{field} must be relative to the project root, got '{value}'"
        )));
    }
    if path
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(ConfigError::Invalid(format!(
            "{field} must not contain '..', got '{value}'"
        )));
    }
    Ok(())
}
