// crates/askbridge/src/config/env.rs
// Environment-based configuration - single source of truth for all env vars

use std::path::PathBuf;
use tracing::{debug, warn};

/// API keys loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Chat-completion key (OPENAI_API_KEY)
    pub openai: Option<String>,
    /// Separate key for the planning model (ASKBRIDGE_PLANNER_API_KEY)
    pub planner: Option<String>,
    /// SerpAPI key (SERPAPI_KEY or SERPAPI_API_KEY)
    pub serpapi: Option<String>,
}

impl ApiKeys {
    /// Load API keys from environment variables
    pub fn from_env() -> Self {
        let keys = Self {
            openai: read_var("OPENAI_API_KEY"),
            planner: read_var("ASKBRIDGE_PLANNER_API_KEY"),
            serpapi: read_var("SERPAPI_KEY").or_else(|| read_var("SERPAPI_API_KEY")),
        };
        keys.log_status();
        keys
    }

    /// Log which API keys are available (without exposing values)
    fn log_status(&self) {
        let summary = self.summary();
        if summary == "None" {
            warn!("No API keys configured - the assistant cannot run");
        } else {
            debug!(keys = %summary, "API keys loaded");
        }
    }

    /// Get a summary of available keys
    pub fn summary(&self) -> String {
        let mut names = Vec::new();
        if self.openai.is_some() {
            names.push("OpenAI");
        }
        if self.planner.is_some() {
            names.push("Planner");
        }
        if self.serpapi.is_some() {
            names.push("SerpAPI");
        }
        if names.is_empty() {
            "None".to_string()
        } else {
            names.join(", ")
        }
    }
}

/// Read a single variable, filtering empty values
fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse a numeric variable, warning on garbage
fn read_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = read_var(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring non-numeric value");
            None
        }
    }
}

/// Everything askbridge reads from the environment
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub api_keys: ApiKeys,
    /// OPENAI_BASE_URL
    pub base_url: Option<String>,
    /// ASKBRIDGE_PLANNER_BASE_URL
    pub planner_base_url: Option<String>,
    /// ASKBRIDGE_EXECUTOR_MODEL
    pub executor_model: Option<String>,
    /// ASKBRIDGE_PLANNER_MODEL
    pub planner_model: Option<String>,
    /// SERPAPI_BASE_URL
    pub search_base_url: Option<String>,
    /// ASKBRIDGE_DB_PATH
    pub db_path: Option<PathBuf>,
    /// ASKBRIDGE_MAX_PHASES
    pub max_phases: Option<u32>,
    /// ASKBRIDGE_MAX_CLARIFICATIONS
    pub max_clarifications: Option<u32>,
    /// ASKBRIDGE_DISABLE_SEARCH - keep web search out of the catalog even with a key
    pub disable_search: bool,
}

impl EnvConfig {
    /// Load all configuration from the process environment
    pub fn load() -> Self {
        Self {
            api_keys: ApiKeys::from_env(),
            base_url: read_var("OPENAI_BASE_URL"),
            planner_base_url: read_var("ASKBRIDGE_PLANNER_BASE_URL"),
            executor_model: read_var("ASKBRIDGE_EXECUTOR_MODEL"),
            planner_model: read_var("ASKBRIDGE_PLANNER_MODEL"),
            search_base_url: read_var("SERPAPI_BASE_URL"),
            db_path: read_var("ASKBRIDGE_DB_PATH").map(PathBuf::from),
            max_phases: read_number("ASKBRIDGE_MAX_PHASES"),
            max_clarifications: read_number("ASKBRIDGE_MAX_CLARIFICATIONS"),
            disable_search: parse_bool_env("ASKBRIDGE_DISABLE_SEARCH").unwrap_or(false),
        }
    }
}

/// Parse a boolean environment variable.
///
/// Returns `Some(true)` for "1", "true", "yes" (case-insensitive),
/// `Some(false)` for "0", "false", "no", and `None` if unset or unrecognized.
pub fn parse_bool_env(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    match val.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Format as a human-readable report
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            for err in &self.errors {
                lines.push(format!("  - {}", err));
            }
        }

        if !self.warnings.is_empty() {
            lines.push("Warnings:".to_string());
            for warning in &self.warnings {
                lines.push(format!("  - {}", warning));
            }
        }

        if lines.is_empty() {
            "Configuration OK".to_string()
        } else {
            lines.join("\n")
        }
    }
}
