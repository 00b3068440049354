// crates/askbridge/src/config/file.rs
// File-based configuration from ~/.askbridge/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level config structure. Every field is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// Execution/synthesis model
    pub llm: LlmSection,
    /// Planning model; unset fields fall back to `[llm]`
    pub planner: LlmSection,
    pub limits: LimitsSection,
    pub search: SearchSection,
    pub database: DatabaseSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LlmSection {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LimitsSection {
    pub max_phases: Option<u32>,
    pub max_clarifications: Option<u32>,
    pub tool_retries: Option<u32>,
    pub executor_model_calls: Option<u32>,
    pub tool_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SearchSection {
    pub base_url: Option<String>,
    pub num_results: Option<u8>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: Option<PathBuf>,
    pub max_rows: Option<usize>,
}

impl FileConfig {
    /// Load config from ~/.askbridge/config.toml
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Per-user directory holding config.toml and .env
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".askbridge")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}
