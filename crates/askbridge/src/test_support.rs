// crates/askbridge/src/test_support.rs
// Scripted test doubles for LLM clients, tools and the user channel

use crate::llm::{ChatResult, FunctionCall, LlmClient, Message, Tool, ToolCall};
use crate::tools::{ToolAdapter, ToolDescriptor, ToolError, ToolKind, UserChannel};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One canned model reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    ToolCall { name: String, arguments: String },
}

/// LLM client that replays a fixed script and records every request
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<Vec<Message>>>,
    offered_tools: Mutex<Vec<Option<Vec<Tool>>>>,
    fail_always: bool,
}

impl ScriptedLlm {
    /// Text replies in order
    pub fn new(replies: Vec<&str>) -> Self {
        Self::from_replies(replies.into_iter().map(|r| ScriptedReply::Text(r.to_string())).collect())
    }

    pub fn from_replies(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    /// Every call fails like an unreachable endpoint
    pub fn failing() -> Self {
        Self {
            fail_always: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn offered_tools(&self) -> Vec<Option<Vec<Tool>>> {
        self.offered_tools.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat(&self, messages: Vec<Message>, tools: Option<Vec<Tool>>) -> Result<ChatResult> {
        self.requests.lock().unwrap().push(messages);
        self.offered_tools.lock().unwrap().push(tools);

        if self.fail_always {
            return Err(anyhow!("Request failed after 3 retries: connection refused"));
        }

        let reply = self.replies.lock().unwrap().pop_front();
        let (content, tool_calls) = match reply {
            Some(ScriptedReply::Text(text)) => (Some(text), None),
            Some(ScriptedReply::ToolCall { name, arguments }) => (
                None,
                Some(vec![ToolCall {
                    id: format!("call_{}", self.call_count()),
                    call_type: "function".into(),
                    function: FunctionCall { name, arguments },
                }]),
            ),
            None => return Err(anyhow!("script exhausted")),
        };

        Ok(ChatResult {
            request_id: format!("scripted-{}", self.call_count()),
            content,
            tool_calls,
            usage: None,
            duration_ms: 0,
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Data tool with a queue of outcomes and a record of invocations
pub struct FakeTool {
    descriptor: ToolDescriptor,
    outcomes: Mutex<VecDeque<Result<Value, ToolError>>>,
    fallback: Option<Value>,
    calls: Mutex<Vec<Value>>,
}

impl FakeTool {
    pub fn new(name: &str) -> Self {
        Self {
            descriptor: ToolDescriptor::new(
                name,
                format!("Fake {}", name),
                json!({
                    "type": "object",
                    "properties": {"query": {"type": "string"}},
                    "required": ["query"]
                }),
                ToolKind::Data,
            ),
            outcomes: Mutex::new(VecDeque::new()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_outcomes(self, outcomes: Vec<Result<Value, ToolError>>) -> Self {
        *self.outcomes.lock().unwrap() = outcomes.into();
        self
    }

    /// Returned once the queue is exhausted
    pub fn always_ok(mut self, value: Value) -> Self {
        self.fallback = Some(value);
        self
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolAdapter for FakeTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        self.calls.lock().unwrap().push(arguments.clone());
        if let Some(outcome) = self.outcomes.lock().unwrap().pop_front() {
            return outcome;
        }
        match &self.fallback {
            Some(v) => Ok(v.clone()),
            None => Err(ToolError::unavailable("no scripted outcome")),
        }
    }
}

/// User channel that answers from a script; closes when exhausted
#[derive(Default)]
pub struct ScriptedUser {
    replies: Mutex<VecDeque<String>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedUser {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(String::from).collect()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserChannel for ScriptedUser {
    async fn ask(&self, question: &str) -> std::io::Result<Option<String>> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self.replies.lock().unwrap().pop_front())
    }
}
