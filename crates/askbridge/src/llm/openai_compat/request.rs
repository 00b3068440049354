// crates/askbridge/src/llm/openai_compat/request.rs
// OpenAI-compatible chat request builder

use crate::llm::{Message, Tool};
use serde::Serialize;

/// Chat completion request (OpenAI-compatible format)
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>, // "auto" | "required" | "none"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Reasoning models reject `max_tokens` and take this instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Reasoning model families (o1, o3, o4) that take `max_completion_tokens`
/// and only accept the default temperature.
pub fn is_reasoning_model(model: &str) -> bool {
    let name = model.rsplit('/').next().unwrap_or(model);
    ["o1", "o3", "o4"]
        .iter()
        .any(|family| name == *family || name.starts_with(&format!("{}-", family)))
}

impl ChatRequest {
    /// Create a new chat request with required fields
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: None,
            tool_choice: None,
            max_tokens: None,
            max_completion_tokens: None,
            temperature: None,
        }
    }

    /// Set tools for function calling
    pub fn with_tools(mut self, tools: Option<Vec<Tool>>) -> Self {
        self.tools = tools.filter(|t| !t.is_empty());
        if self.tools.is_some() {
            self.tool_choice = Some("auto".into());
        }
        self
    }

    /// Set the output token cap, using the field the model family expects
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        if is_reasoning_model(&self.model) {
            self.max_completion_tokens = Some(max_tokens);
        } else {
            self.max_tokens = Some(max_tokens);
        }
        self
    }

    /// Set temperature (0.0 to 2.0); ignored for reasoning models
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        if !is_reasoning_model(&self.model) {
            self.temperature = Some(temperature);
        }
        self
    }
}
