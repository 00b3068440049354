// crates/askbridge/src/transcript.rs
// Append-only record of one request's tool results and dialogue turns

use crate::tools::{ToolError, ToolErrorKind};
use crate::utils::truncate;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

/// Outcome of one tool invocation
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub tool: String,
    pub arguments: Value,
    /// Adapter output; `Value::Null` on failure
    pub output: Value,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolFailure>,
    /// 1 for the first try, 2+ for retries
    pub attempt: u32,
    pub at: DateTime<Utc>,
}

/// Serializable view of a [`ToolError`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolFailure {
    pub kind: &'static str,
    pub message: String,
}

impl ToolResult {
    pub fn success(tool: impl Into<String>, arguments: Value, output: Value, attempt: u32) -> Self {
        Self {
            tool: tool.into(),
            arguments,
            output,
            success: true,
            error: None,
            attempt,
            at: Utc::now(),
        }
    }

    pub fn failure(tool: impl Into<String>, arguments: Value, error: &ToolError, attempt: u32) -> Self {
        Self {
            tool: tool.into(),
            arguments,
            output: Value::Null,
            success: false,
            error: Some(ToolFailure {
                kind: error.kind.as_str(),
                message: error.message.clone(),
            }),
            attempt,
            at: Utc::now(),
        }
    }

    /// Build from an adapter return value
    pub fn from_outcome(
        tool: impl Into<String>,
        arguments: Value,
        outcome: &Result<Value, ToolError>,
        attempt: u32,
    ) -> Self {
        match outcome {
            Ok(output) => Self::success(tool, arguments, output.clone(), attempt),
            Err(e) => Self::failure(tool, arguments, e, attempt),
        }
    }

    pub fn failure_kind(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.kind)
    }

    pub fn failed_with(&self, kind: ToolErrorKind) -> bool {
        self.failure_kind() == Some(kind.as_str())
    }
}

/// Who said what during a clarification round
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum DialogueTurn {
    Question { text: String },
    Answer { text: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum TranscriptEntry {
    Tool(ToolResult),
    Dialogue(DialogueTurn),
}

/// Owned by a single run; there is no way to edit or remove entries.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tool(&mut self, result: ToolResult) {
        self.entries.push(TranscriptEntry::Tool(result));
    }

    pub fn record_question(&mut self, text: impl Into<String>) {
        self.entries
            .push(TranscriptEntry::Dialogue(DialogueTurn::Question { text: text.into() }));
    }

    pub fn record_answer(&mut self, text: impl Into<String>) {
        self.entries
            .push(TranscriptEntry::Dialogue(DialogueTurn::Answer { text: text.into() }));
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.entries.iter().filter_map(|e| match e {
            TranscriptEntry::Tool(r) => Some(r),
            TranscriptEntry::Dialogue(_) => None,
        })
    }

    pub fn successful_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.tool_results().filter(|r| r.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ToolResult> {
        self.tool_results().filter(|r| !r.success)
    }

    /// Any successful call to a data tool (dialogue answers don't count)
    pub fn has_successful_data(&self, dialogue_tool: Option<&str>) -> bool {
        self.successful_results()
            .any(|r| Some(r.tool.as_str()) != dialogue_tool)
    }

    /// Compact JSON for prompts, capped at `max_chars` bytes
    pub fn to_context_json(&self, max_chars: usize) -> String {
        let items: Vec<Value> = self
            .entries
            .iter()
            .map(|e| match e {
                TranscriptEntry::Tool(r) if r.success => json!({
                    "tool": r.tool,
                    "arguments": r.arguments,
                    "output": r.output,
                }),
                TranscriptEntry::Tool(r) => json!({
                    "tool": r.tool,
                    "arguments": r.arguments,
                    "error": r.error,
                }),
                TranscriptEntry::Dialogue(DialogueTurn::Question { text }) => {
                    json!({ "assistant_asked": text })
                }
                TranscriptEntry::Dialogue(DialogueTurn::Answer { text }) => {
                    json!({ "user_answered": text })
                }
            })
            .collect();
        let rendered = serde_json::to_string_pretty(&items).unwrap_or_default();
        truncate(&rendered, max_chars)
    }
}
