// crates/askbridge/src/tools/mod.rs
// Tool adapters: the invoke contract, descriptors and typed failures

pub mod catalog;
pub mod database;
pub mod dialogue;
pub mod search;

pub use catalog::ToolCatalog;
pub use database::{DatabasePool, DatabaseTool};
pub use dialogue::{DialogueTool, TerminalChannel, UserChannel};
pub use search::WebSearchTool;

use crate::llm::Tool;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Whether a tool fetches data or talks to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Data,
    Dialogue,
}

/// Named capability descriptor exposed to the planner and executor
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object
    pub parameters: Value,
    pub kind: ToolKind,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        kind: ToolKind,
    ) -> Self {
        Self {
            name: sanitize_tool_name(&name.into()),
            description: description.into(),
            parameters,
            kind,
        }
    }

    /// Function-calling definition for the chat API
    pub fn to_llm_tool(&self) -> Tool {
        Tool::function(&self.name, &self.description, self.parameters.clone())
    }

    /// Names listed under the schema's `required`
    pub fn required_params(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|req| req.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// First required parameter that is absent, null or blank
    pub fn missing_required(&self, arguments: &Value) -> Option<String> {
        self.required_params()
            .into_iter()
            .find(|name| match arguments.get(*name) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .map(str::to_string)
    }
}

/// Classification of adapter failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// Missing or malformed arguments; retrying the same call cannot help
    InvalidArguments,
    /// The call worked but produced nothing usable
    EmptyResult,
    /// Network, provider or storage failure
    Unavailable,
    /// The step named a tool that is not registered
    UnknownTool,
}

impl ToolErrorKind {
    /// Only transient failures are worth another attempt
    pub fn is_retryable(self) -> bool {
        matches!(self, ToolErrorKind::Unavailable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToolErrorKind::InvalidArguments => "invalid_arguments",
            ToolErrorKind::EmptyResult => "empty_result",
            ToolErrorKind::Unavailable => "unavailable",
            ToolErrorKind::UnknownTool => "unknown_tool",
        }
    }
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed failure returned by every adapter instead of panicking
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArguments, message)
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::EmptyResult, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Unavailable, message)
    }

    pub fn unknown(tool: &str) -> Self {
        Self::new(ToolErrorKind::UnknownTool, format!("no tool named '{}'", tool))
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Common invoke contract for search, database and dialogue adapters.
///
/// Implementations hold no per-request state and never panic: every
/// failure is returned as a [`ToolError`].
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;

    async fn invoke(&self, arguments: &Value) -> Result<Value, ToolError>;

    /// Extra context for the execution model (e.g. a database schema)
    async fn prompt_context(&self) -> Option<String> {
        None
    }
}

/// Normalize a tool name for OpenAI-compatible function calling
pub fn sanitize_tool_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// String argument, trimmed, or None when absent or blank
pub fn string_arg<'a>(arguments: &'a Value, name: &str) -> Option<&'a str> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
