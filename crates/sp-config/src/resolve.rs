//! Configuration resolution.
//!
//! Implements deterministic config resolution order:
//! 1. Explicit CLI flag (`--config`)
//! 2. `SURVEY_PIPELINE_CONFIG` environment variable
//! 3. `pipeline.json` in the project root
//! 4. Built-in defaults

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{ConfigError, PipelineConfig, Result};

const ENV_CONFIG: &str = "SURVEY_PIPELINE_CONFIG";
const CONFIG_FILE_NAME: &str = "pipeline.json";

/// How the config file was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigResolution {
    /// From explicit CLI flag
    CliFlag,
    /// From environment variable
    EnvVar,
    /// From pipeline.json in the project root
    ProjectFile,
    /// Using built-in defaults
    Default,
}

impl std::fmt::Display for ConfigResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigResolution::CliFlag => write!(f, "cli"),
            ConfigResolution::EnvVar => write!(f, "env"),
            ConfigResolution::ProjectFile => write!(f, "project"),
            ConfigResolution::Default => write!(f, "default"),
        }
    }
}

/// Metadata about how a configuration was loaded, for audit output.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    /// Path to the config file, or None if using defaults
    pub path: Option<String>,
    /// SHA-256 hash of file contents, or None if defaults
    pub hash: Option<String>,
    /// Resolution source (cli/env/project/default)
    pub resolution: String,
}

/// Configuration resolver with deterministic resolution order.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    /// Explicit path from a CLI flag.
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver with an optional CLI override.
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        ConfigResolver { cli_path }
    }

    /// Resolve the config file path for a project root.
    pub fn resolve_path(&self, project_root: &Path) -> (Option<PathBuf>, ConfigResolution) {
        if let Some(ref path) = self.cli_path {
            return (Some(path.clone()), ConfigResolution::CliFlag);
        }

        if let Ok(path) = env::var(ENV_CONFIG) {
            return (Some(PathBuf::from(path)), ConfigResolution::EnvVar);
        }

        let project_file = project_root.join(CONFIG_FILE_NAME);
        if project_file.exists() {
            return (Some(project_file), ConfigResolution::ProjectFile);
        }

        (None, ConfigResolution::Default)
    }

    /// Load and validate the configuration for a project root.
    ///
    /// An explicitly named file (CLI or env) that is missing or malformed
    /// is an error; absence of the project file falls back to defaults.
    pub fn load(&self, project_root: &Path) -> Result<(PipelineConfig, ConfigSnapshot)> {
        let (path, resolution) = self.resolve_path(project_root);

        let (config, snapshot) = match path {
            Some(p) => {
                let content = fs::read_to_string(&p).map_err(|e| ConfigError::Io {
                    path: p.clone(),
                    source: e,
                })?;

                let hash = compute_sha256(&content);

                let config: PipelineConfig =
                    serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                        path: p.clone(),
                        source: e,
                    })?;

                debug!(path = %p.display(), source = %resolution, "loaded pipeline config");

                (
                    config,
                    ConfigSnapshot {
                        path: Some(p.to_string_lossy().to_string()),
                        hash: Some(hash),
                        resolution: resolution.to_string(),
                    },
                )
            }
            None => {
                debug!("no pipeline config found, using built-in defaults");
                (
                    PipelineConfig::default(),
                    ConfigSnapshot {
                        path: None,
                        hash: None,
                        resolution: ConfigResolution::Default.to_string(),
                    },
                )
            }
        };

        config.validate()?;
        Ok((config, snapshot))
    }
}

fn compute_sha256(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn defaults_when_no_file() {
        let root = tempdir().unwrap();
        let resolver = ConfigResolver::new(None);
        let (path, resolution) = resolver.resolve_path(root.path());
        assert!(path.is_none());
        assert_eq!(resolution, ConfigResolution::Default);

        let (config, snapshot) = resolver.load(root.path()).unwrap();
        assert_eq!(config.publish.stable_directory, "cleaned_stable");
        assert!(snapshot.path.is_none());
        assert_eq!(snapshot.resolution, "default");
    }

    #[test]
    fn project_file_is_picked_up() {
        let root = tempdir().unwrap();
        let config_path = root.path().join("pipeline.json");
        let mut f = fs::File::create(&config_path).unwrap();
        write!(f, r#"{{"publish": {{"stable_directory": "published"}}}}"#).unwrap();

        let resolver = ConfigResolver::new(None);
        let (config, snapshot) = resolver.load(root.path()).unwrap();
        assert_eq!(config.publish.stable_directory, "published");
        assert_eq!(snapshot.resolution, "project");
        assert_eq!(snapshot.hash.unwrap().len(), 64);
    }

    #[test]
    fn cli_flag_beats_project_file() {
        let root = tempdir().unwrap();
        fs::write(
            root.path().join("pipeline.json"),
            r#"{"publish": {"stable_directory": "from_project"}}"#,
        )
        .unwrap();
        let cli_path = root.path().join("other.json");
        fs::write(
            &cli_path,
            r#"{"publish": {"stable_directory": "from_cli"}}"#,
        )
        .unwrap();

        let resolver = ConfigResolver::new(Some(cli_path));
        let (config, snapshot) = resolver.load(root.path()).unwrap();
        assert_eq!(config.publish.stable_directory, "from_cli");
        assert_eq!(snapshot.resolution, "cli");
    }

    #[test]
    fn missing_cli_file_is_an_error() {
        let root = tempdir().unwrap();
        let resolver = ConfigResolver::new(Some(root.path().join("missing.json")));
        assert!(resolver.load(root.path()).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("pipeline.json"), "not json").unwrap();
        let resolver = ConfigResolver::new(None);
        assert!(resolver.load(root.path()).is_err());
    }

    #[test]
    fn invalid_values_fail_fast() {
        let root = tempdir().unwrap();
        fs::write(
            root.path().join("pipeline.json"),
            r#"{"publish": {"stable_directory": "a/b"}}"#,
        )
        .unwrap();
        let resolver = ConfigResolver::new(None);
        assert!(resolver.load(root.path()).is_err());
    }
}
