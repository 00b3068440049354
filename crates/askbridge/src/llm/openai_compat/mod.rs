// crates/askbridge/src/llm/openai_compat/mod.rs
// Shared OpenAI-compatible request/response handling

mod request;
mod response;

pub use request::{ChatRequest, is_reasoning_model};
pub use response::{ChatResponse, ResponseChoice, parse_chat_response};
