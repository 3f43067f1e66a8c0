//! Compiler configuration.
//!
//! Configuration can come from:
//! - Config file (`skillc.toml` in the working directory, or `--config PATH`)
//! - Environment variables (`SKILLC_*`)
//!
//! Missing or unreadable files fall back to defaults; a malformed file is an
//! error. CLI flags are applied last by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "skillc.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed config file '{path}': {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Root directory for generated bundles
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Append `_<YYYYmmdd_HHMMSS>` to bundle directory names
    #[serde(default = "default_timestamped_output")]
    pub timestamped_output: bool,

    /// Seed for the mock backend; the skill id when unset
    #[serde(default)]
    pub mock_seed: Option<String>,

    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            timestamped_output: default_timestamped_output(),
            mock_seed: None,
            log_filter: default_log_filter(),
        }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("output")
}

fn default_timestamped_output() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl CompilerConfig {
    /// Load from `path` (or `skillc.toml`), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let mut config = Self::default();
        if let Some(partial) = Self::load_partial_from_path(path)? {
            config.apply_partial(partial);
        }
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Defaults plus environment overrides, ignoring any config file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Parse TOML text on top of the defaults.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let partial: PartialConfig = toml::from_str(content)?;
        let mut config = Self::default();
        config.apply_partial(partial);
        Ok(config)
    }

    /// Apply `SKILLC_OUTPUT_ROOT`, `SKILLC_MOCK_SEED` and `SKILLC_LOG` as
    /// returned by `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(root) = lookup("SKILLC_OUTPUT_ROOT") {
            self.output_root = PathBuf::from(root);
        }
        if let Some(seed) = lookup("SKILLC_MOCK_SEED") {
            self.mock_seed = Some(seed);
        }
        if let Some(filter) = lookup("SKILLC_LOG") {
            self.log_filter = filter;
        }
    }

    fn load_partial_from_path(path: &Path) -> Result<Option<PartialConfig>, ConfigError> {
        let Ok(content) = std::fs::read_to_string(path) else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(None);
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Malformed {
                path: path.to_path_buf(),
                source,
            })
    }

    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(root) = partial.output_root {
            self.output_root = root;
        }
        if let Some(timestamped) = partial.timestamped_output {
            self.timestamped_output = timestamped;
        }
        if partial.mock_seed.is_some() {
            self.mock_seed = partial.mock_seed;
        }
        if let Some(filter) = partial.log_filter {
            self.log_filter = filter;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    output_root: Option<PathBuf>,
    timestamped_output: Option<bool>,
    mock_seed: Option<String>,
    log_filter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.output_root, PathBuf::from("output"));
        assert!(config.timestamped_output);
        assert_eq!(config.mock_seed, None);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = CompilerConfig::from_toml("timestamped_output = false\n").unwrap();
        assert!(!config.timestamped_output);
        assert_eq!(config.output_root, PathBuf::from("output"));
    }

    #[test]
    fn env_overrides_win() {
        let mut config = CompilerConfig::from_toml("mock_seed = \"file\"").unwrap();
        let env: HashMap<&str, &str> =
            [("SKILLC_MOCK_SEED", "env"), ("SKILLC_OUTPUT_ROOT", "/tmp/bundles")].into();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.mock_seed.as_deref(), Some("env"));
        assert_eq!(config.output_root, PathBuf::from("/tmp/bundles"));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = CompilerConfig::load_partial_from_path(&dir.path().join("absent.toml"));
        assert!(config.unwrap().is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillc.toml");
        std::fs::write(&path, "output_root = [unterminated\n").unwrap();

        let err = CompilerConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(&err, ConfigError::Malformed { path: p, .. } if p == &path));
        assert!(err.to_string().starts_with("malformed config file '"));
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillc.toml");
        std::fs::write(&path, "output_root = \"bundles\"\nlog_filter = \"debug\"\n").unwrap();
        let partial = CompilerConfig::load_partial_from_path(&path).unwrap().unwrap();
        let mut config = CompilerConfig::default();
        config.apply_partial(partial);
        assert_eq!(config.output_root, PathBuf::from("bundles"));
        assert_eq!(config.log_filter, "debug");
    }
}
