// crates/askbridge/src/llm/provider.rs
// LLM client abstraction layer

use anyhow::Result;
use async_trait::async_trait;

use super::{ChatResult, Message, Tool};

/// Trait for chat-completion clients.
///
/// Planner, executor and synthesizer each hold an `Arc<dyn LlmClient>`, so
/// tests can substitute scripted clients per component.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request
    async fn chat(&self, messages: Vec<Message>, tools: Option<Vec<Tool>>) -> Result<ChatResult>;

    /// Model identifier used for requests
    fn model_name(&self) -> &str;
}
