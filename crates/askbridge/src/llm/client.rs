// crates/askbridge/src/llm/client.rs
// Chat-completion client for any OpenAI-compatible endpoint

use crate::config::LlmSettings;
use crate::llm::http_client::LlmHttpClient;
use crate::llm::openai_compat::{ChatRequest, parse_chat_response};
use crate::llm::provider::LlmClient;
use crate::llm::{ChatResult, Message, Tool};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{Span, debug, info, instrument};
use uuid::Uuid;

/// Client for `{base_url}/chat/completions`
pub struct OpenAiCompatClient {
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
    max_tokens: u32,
    http: LlmHttpClient,
}

impl OpenAiCompatClient {
    /// Create a client from resolved settings
    pub fn new(settings: &LlmSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            endpoint: Self::endpoint_for(&settings.base_url),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            http: LlmHttpClient::default(),
        }
    }

    /// Replace the HTTP transport (timeouts, retry policy)
    pub fn with_http(mut self, http: LlmHttpClient) -> Self {
        self.http = http;
        self
    }

    /// Chat-completions URL for a base URL with or without trailing slash
    fn endpoint_for(base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    #[instrument(skip(self, messages, tools), fields(request_id, model = %self.model, message_count = messages.len()))]
    async fn chat(&self, messages: Vec<Message>, tools: Option<Vec<Tool>>) -> Result<ChatResult> {
        let request_id = Uuid::new_v4().to_string();
        let start_time = Instant::now();
        Span::current().record("request_id", &request_id);

        info!(
            request_id = %request_id,
            message_count = messages.len(),
            tool_count = tools.as_ref().map(|t| t.len()).unwrap_or(0),
            model = %self.model,
            "Starting chat request"
        );

        let request = ChatRequest::new(&self.model, messages)
            .with_tools(tools)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let body = serde_json::to_string(&request)?;
        debug!(request_id = %request_id, endpoint = %self.endpoint, "Chat request body: {}", body);

        let response_body = self
            .http
            .post_json(&request_id, &self.endpoint, &self.api_key, body)
            .await?;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let result = parse_chat_response(&response_body, &request_id, duration_ms)?;

        if let Some(ref u) = result.usage {
            super::logging::log_usage(&request_id, &self.model, u);
        }
        if let Some(ref tcs) = result.tool_calls {
            super::logging::log_tool_calls(&request_id, &self.model, tcs);
        }
        super::logging::log_completion(
            &request_id,
            &self.model,
            duration_ms,
            result.content.as_ref().map(|c| c.len()).unwrap_or(0),
            result.tool_calls.as_ref().map(|t| t.len()).unwrap_or(0),
        );

        Ok(result)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
