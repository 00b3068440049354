// crates/askbridge/src/llm/openai_compat/response.rs
// OpenAI-compatible chat response parsing

use crate::llm::{ChatResult, FunctionCall, ToolCall, Usage};
use anyhow::{Result, anyhow};
use serde::Deserialize;

/// Non-streaming chat response (OpenAI-compatible format)
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ResponseChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseChoice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,
    pub function: ResponseFunction,
}

fn default_call_type() -> String {
    "function".into()
}

#[derive(Debug, Deserialize)]
pub struct ResponseFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// Parse an OpenAI-compatible chat response into a ChatResult
pub fn parse_chat_response(
    response_body: &str,
    request_id: &str,
    duration_ms: u64,
) -> Result<ChatResult> {
    let data: ChatResponse = serde_json::from_str(response_body)
        .map_err(|e| anyhow!("Failed to parse chat response: {}", e))?;

    let Some(choice) = data.choices.into_iter().next() else {
        return Err(anyhow!("Chat response contained no choices"));
    };

    if choice.finish_reason.as_deref() == Some("length") {
        tracing::warn!(request_id = %request_id, "Chat response truncated at token limit");
    }

    let msg = choice.message;
    let tool_calls = msg
        .tool_calls
        .map(|calls| {
            calls
                .into_iter()
                .map(|tc| ToolCall {
                    id: tc.id,
                    call_type: tc.call_type,
                    function: FunctionCall {
                        name: tc.function.name,
                        arguments: tc.function.arguments,
                    },
                })
                .collect::<Vec<_>>()
        })
        .filter(|calls| !calls.is_empty());

    Ok(ChatResult {
        request_id: request_id.to_owned(),
        content: msg.content,
        tool_calls,
        usage: data.usage,
        duration_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_response() {
        let json = r#"{
            "choices": [{
                "message": {
                    "content": "Fighters of the Crystal です"
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 5,
                "total_tokens": 15
            }
        }"#;

        let result = parse_chat_response(json, "test-123", 100).unwrap();
        assert_eq!(result.request_id, "test-123");
        assert_eq!(result.content.as_deref(), Some("Fighters of the Crystal です"));
        assert!(result.tool_calls.is_none());
        assert_eq!(result.usage.unwrap().total_tokens, 15);
        assert_eq!(result.duration_ms, 100);
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let json = r#"{
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "web_search",
                            "arguments": "{\"query\": \"FF11 Arch Angel\"}"
                        }
                    }]
                }
            }],
            "usage": null
        }"#;

        let result = parse_chat_response(json, "test-456", 200).unwrap();
        assert!(result.content.is_none());
        let calls = result.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_123");
        assert_eq!(calls[0].function.name, "web_search");
    }

    #[test]
    fn test_parse_empty_tool_calls_is_none() {
        let json = r#"{"choices": [{"message": {"content": "hi", "tool_calls": []}}]}"#;
        let result = parse_chat_response(json, "r", 0).unwrap();
        assert!(result.tool_calls.is_none());
    }

    #[test]
    fn test_parse_no_choices() {
        let json = r#"{"choices": [], "usage": null}"#;
        let err = parse_chat_response(json, "r", 0).unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_chat_response("<html>502</html>", "r", 0).unwrap_err();
        assert!(err.to_string().contains("Failed to parse chat response"));
    }
}
