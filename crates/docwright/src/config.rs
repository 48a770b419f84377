//! Configuration file support for docwright.
//!
//! Settings come from `docwright.toml` in the working directory, falling back
//! to `<config_dir>/docwright/config.toml`. Command-line flags override both.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use docwright_core::{DEFAULT_MAX_TURNS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};

/// The project config file name
pub const CONFIG_FILE_NAME: &str = "docwright.toml";

/// Directory under the user config dir holding the global config
pub const GLOBAL_CONFIG_DIR: &str = "docwright";

pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_TARGET_FILE: &str = "README.md";

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings readable from a config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    /// 0 means unlimited
    pub max_turns: Option<usize>,
    pub base_url: Option<String>,
    /// Document to update
    pub file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Load a config file.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if the file exists and parses successfully
    /// - `Ok(None)` if the file does not exist
    /// - `Err(...)` if the file exists but fails to parse (hard error)
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(config))
    }

    /// Load `docwright.toml` from the working directory
    pub fn load_project(working_dir: &Path) -> Result<Option<Self>> {
        Self::load_from(&working_dir.join(CONFIG_FILE_NAME))
    }

    /// Load the user-wide config, if the platform has a config directory
    pub fn load_global() -> Result<Option<Self>> {
        match global_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Fill unset keys from `fallback`
    pub fn or(self, fallback: FileConfig) -> FileConfig {
        FileConfig {
            model: self.model.or(fallback.model),
            temperature: self.temperature.or(fallback.temperature),
            max_turns: self.max_turns.or(fallback.max_turns),
            base_url: self.base_url.or(fallback.base_url),
            file: self.file.or(fallback.file),
            timeout_secs: self.timeout_secs.or(fallback.timeout_secs),
        }
    }
}

pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_FILE))
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: String,
    pub temperature: f32,
    /// None means unlimited
    pub max_turns: Option<usize>,
    pub base_url: Option<String>,
    pub file: PathBuf,
    pub timeout: Duration,
}

impl Settings {
    /// Apply precedence: `overrides` (from the CLI) > `config` > defaults
    pub fn resolve(overrides: FileConfig, config: FileConfig) -> Self {
        let merged = overrides.or(config);
        let max_turns = merged.max_turns.unwrap_or(DEFAULT_MAX_TURNS);

        Self {
            model: merged.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: merged.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_turns: (max_turns > 0).then_some(max_turns),
            base_url: merged.base_url,
            file: merged
                .file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGET_FILE)),
            timeout: Duration::from_secs(merged.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }
}
