// crates/askbridge/src/config/mod.rs
// Configuration resolution: CLI flag > environment > config file > defaults

pub mod env;
pub mod file;

pub use env::{ApiKeys, ConfigValidation, EnvConfig, parse_bool_env};
pub use file::FileConfig;

use crate::orchestrator::LoopLimits;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EXECUTOR_MODEL: &str = "gpt-4o";
pub const DEFAULT_PLANNER_MODEL: &str = "o1-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
/// Reasoning models spend most of their budget thinking
pub const DEFAULT_PLANNER_MAX_TOKENS: u32 = 32768;
pub const DEFAULT_SEARCH_URL: &str = "https://serpapi.com/search";
pub const DEFAULT_SEARCH_RESULTS: u8 = 5;
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DB_PATH: &str = "./test.db";
pub const DEFAULT_MAX_ROWS: usize = 200;

/// Connection settings for one chat-completion model
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// None keeps web search out of the tool catalog
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_results: u8,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub max_rows: usize,
}

/// Fully resolved configuration handed to each component at construction
#[derive(Debug, Clone)]
pub struct Config {
    pub executor: LlmSettings,
    pub planner: LlmSettings,
    pub search: SearchSettings,
    pub database: DatabaseSettings,
    pub limits: LoopLimits,
}

impl Config {
    /// Load from the environment and ~/.askbridge/config.toml
    pub fn load(db_override: Option<PathBuf>) -> Self {
        Self::resolve(&EnvConfig::load(), &FileConfig::load(), db_override)
    }

    /// Merge the sources; the earliest source that sets a value wins
    pub fn resolve(env: &EnvConfig, file: &FileConfig, db_override: Option<PathBuf>) -> Self {
        let api_key = env.api_keys.openai.clone().unwrap_or_default();
        let base_url = env
            .base_url
            .clone()
            .or_else(|| file.llm.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let executor = LlmSettings {
            api_key: api_key.clone(),
            base_url: base_url.clone(),
            model: env
                .executor_model
                .clone()
                .or_else(|| file.llm.model.clone())
                .unwrap_or_else(|| DEFAULT_EXECUTOR_MODEL.to_string()),
            temperature: file.llm.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: file.llm.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };

        let planner = LlmSettings {
            api_key: env.api_keys.planner.clone().unwrap_or(api_key),
            base_url: env
                .planner_base_url
                .clone()
                .or_else(|| file.planner.base_url.clone())
                .unwrap_or(base_url),
            model: env
                .planner_model
                .clone()
                .or_else(|| file.planner.model.clone())
                .unwrap_or_else(|| DEFAULT_PLANNER_MODEL.to_string()),
            temperature: file
                .planner
                .temperature
                .or(file.llm.temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: file
                .planner
                .max_tokens
                .unwrap_or(DEFAULT_PLANNER_MAX_TOKENS),
        };

        let search = SearchSettings {
            api_key: if env.disable_search {
                None
            } else {
                env.api_keys.serpapi.clone()
            },
            base_url: env
                .search_base_url
                .clone()
                .or_else(|| file.search.base_url.clone())
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            default_results: file
                .search
                .num_results
                .unwrap_or(DEFAULT_SEARCH_RESULTS)
                .clamp(1, 10),
            timeout: Duration::from_secs(
                file.search
                    .timeout_secs
                    .unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS),
            ),
        };

        let database = DatabaseSettings {
            path: db_override
                .or_else(|| env.db_path.clone())
                .or_else(|| file.database.path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            max_rows: file.database.max_rows.unwrap_or(DEFAULT_MAX_ROWS),
        };

        let defaults = LoopLimits::default();
        let limits = LoopLimits {
            max_phases: env
                .max_phases
                .or(file.limits.max_phases)
                .unwrap_or(defaults.max_phases),
            max_clarifications: env
                .max_clarifications
                .or(file.limits.max_clarifications)
                .unwrap_or(defaults.max_clarifications),
            tool_retries: file.limits.tool_retries.unwrap_or(defaults.tool_retries),
            executor_model_calls: file
                .limits
                .executor_model_calls
                .unwrap_or(defaults.executor_model_calls),
            tool_timeout: file
                .limits
                .tool_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.tool_timeout),
        };

        Self {
            executor,
            planner,
            search,
            database,
            limits,
        }
    }

    /// Check the resolved configuration for problems
    pub fn validate(&self) -> ConfigValidation {
        let mut v = ConfigValidation::new();

        if self.executor.api_key.is_empty() {
            v.add_error("OPENAI_API_KEY is not set");
        }
        if self.planner.api_key.is_empty() && !self.executor.api_key.is_empty() {
            v.add_error("planner API key is empty");
        }
        if url::Url::parse(&self.executor.base_url).is_err() {
            v.add_error(format!("invalid base URL: {}", self.executor.base_url));
        }
        if url::Url::parse(&self.planner.base_url).is_err() {
            v.add_error(format!("invalid planner base URL: {}", self.planner.base_url));
        }
        if self.limits.max_phases < 3 {
            v.add_error(format!(
                "max_phases = {} cannot fit planning, execution and one clarification",
                self.limits.max_phases
            ));
        }

        if self.search.api_key.is_none() {
            v.add_warning("SERPAPI_KEY is not set - web search disabled");
        } else if url::Url::parse(&self.search.base_url).is_err() {
            v.add_error(format!("invalid search URL: {}", self.search.base_url));
        }
        if !self.database.path.exists() {
            v.add_warning(format!(
                "database {} does not exist - database queries will fail",
                self.database.path.display()
            ));
        }
        if self.limits.max_clarifications == 0 {
            v.add_warning("max_clarifications = 0 - ambiguous questions get a restate request");
        }

        v
    }
}
