//! User configuration: TOML file plus environment overrides.
//!
//! The file lives at `<config dir>/commity/config.toml` and is optional.
//! `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_MODEL` take priority over
//! file values when set to a non-empty string.

mod save;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::diff::TruncationLimits;
use crate::error::ConfigError;

const APP_NAME: &str = "commity";
const CONFIG_FILE: &str = "config.toml";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Commit types offered to the model by default.
pub const DEFAULT_TYPES: [&str; 7] = ["feat", "fix", "docs", "style", "refactor", "test", "chore"];

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MODEL: &str = "OPENAI_MODEL";

/// `[ai]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Appended verbatim to every prompt.
    pub custom_instructions: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key: None,
            custom_instructions: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[commit]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    pub conventional: bool,
    pub types: Vec<String>,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            conventional: true,
            types: DEFAULT_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Full configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ai: AiConfig,
    pub commit: CommitConfig,
    pub diff: TruncationLimits,
}

/// Default config file location.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join(APP_NAME).join(CONFIG_FILE))
}

/// Whether a config file exists at `path`. `false` means first run.
pub fn exists(path: &Path) -> bool {
    path.is_file()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn env_value(key: &str) -> Option<String> {
    non_empty(std::env::var(key).ok())
}

impl Config {
    /// Load from `path`, apply environment overrides and validate.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if exists(path) {
            let content = std::fs::read_to_string(path).map_err(|source| {
                ConfigError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            Self::parse(path, &content)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let mut config: Config =
            toml::from_str(content).map_err(|source| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source,
            })?;

        // Empty strings in the file mean "not set".
        config.ai.base_url = non_empty(config.ai.base_url.take());
        config.ai.api_key = non_empty(config.ai.api_key.take());
        config.ai.custom_instructions = non_empty(config.ai.custom_instructions.take());
        if config.ai.model.trim().is_empty() {
            config.ai.model = DEFAULT_MODEL.to_string();
        }

        Ok(config)
    }

    /// Overlay `OPENAI_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Some(key) = env_value(ENV_API_KEY) {
            debug!("Using API key from {}", ENV_API_KEY);
            self.ai.api_key = Some(key);
        }
        if let Some(url) = env_value(ENV_BASE_URL) {
            self.ai.base_url = Some(url);
        }
        if let Some(model) = env_value(ENV_MODEL) {
            self.ai.model = model;
        }
    }

    /// Reject values the rest of the tool cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.diff.show_lines == 0 {
            return Err(ConfigError::Invalid {
                key: "diff.show_lines",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.diff.max_diff_size == 0 {
            return Err(ConfigError::Invalid {
                key: "diff.max_diff_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.ai.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "ai.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.commit.conventional && self.commit.types.is_empty() {
            return Err(ConfigError::Invalid {
                key: "commit.types",
                reason: "conventional commits need at least one type".to_string(),
            });
        }
        Ok(())
    }
}
