// crates/askbridge/src/tools/dialogue.rs
// Clarifying dialogue with the end user

use super::{ToolAdapter, ToolDescriptor, ToolError, ToolKind, string_arg};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::debug;

pub const TOOL_NAME: &str = "human_interaction";

/// Text channel to the person asking the question
#[async_trait]
pub trait UserChannel: Send + Sync {
    /// Show `question` and wait for one reply line. `Ok(None)` means the
    /// channel is closed (EOF).
    async fn ask(&self, question: &str) -> std::io::Result<Option<String>>;
}

/// stdin/stdout channel. Reads happen on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalChannel;

#[async_trait]
impl UserChannel for TerminalChannel {
    async fn ask(&self, question: &str) -> std::io::Result<Option<String>> {
        let question = question.to_string();
        tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "\n{}", question)?;
            write!(stdout, "> ")?;
            stdout.flush()?;
            drop(stdout);

            let mut line = String::new();
            let read = std::io::stdin().lock().read_line(&mut line)?;
            Ok::<_, std::io::Error>(if read == 0 {
                None
            } else {
                Some(line.trim_end_matches(['\r', '\n']).to_string())
            })
        })
        .await
        .map_err(std::io::Error::other)?
    }
}

/// `human_interaction` tool adapter
pub struct DialogueTool {
    channel: Arc<dyn UserChannel>,
    descriptor: ToolDescriptor,
}

impl DialogueTool {
    pub fn new(channel: Arc<dyn UserChannel>) -> Self {
        Self {
            channel,
            descriptor: ToolDescriptor::new(
                TOOL_NAME,
                "Ask the user a clarifying question and wait for their answer. \
                 Use this alone, before any searches, when the request is ambiguous.",
                json!({
                    "type": "object",
                    "properties": {
                        "question": {
                            "type": "string",
                            "description": "The question to ask the user"
                        }
                    },
                    "required": ["question"]
                }),
                ToolKind::Dialogue,
            ),
        }
    }
}

#[async_trait]
impl ToolAdapter for DialogueTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        let question = string_arg(arguments, "question")
            .ok_or_else(|| ToolError::invalid("question is required"))?;

        let reply = self
            .channel
            .ask(question)
            .await
            .map_err(|e| ToolError::unavailable(format!("could not reach the user: {}", e)))?
            .ok_or_else(|| ToolError::unavailable("user input closed"))?;

        let answer = reply.trim();
        if answer.is_empty() {
            return Err(ToolError::empty("user gave an empty answer"));
        }

        debug!(question = %question, answer_len = answer.len(), "User answered");
        Ok(json!({ "question": question, "answer": answer }))
    }
}
