// crates/askbridge/src/llm/mod.rs
// Chat-completion clients for the planning and execution models

mod client;
pub mod http_client;
pub mod logging;
pub mod openai_compat;
mod provider;
mod types;

pub use client::OpenAiCompatClient;
pub use http_client::{LlmHttpClient, RetryPolicy};
pub use provider::LlmClient;
pub use types::{ChatResult, FunctionCall, FunctionDef, Message, Tool, ToolCall, Usage};
