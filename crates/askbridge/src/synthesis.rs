// crates/askbridge/src/synthesis.rs
// Final answer synthesis from the transcript

use crate::llm::LlmClient;
use crate::prompts::{PromptBuilder, RESTATE_MESSAGE};
use crate::request::Request;
use crate::transcript::{ToolResult, Transcript};
use crate::utils::truncate;
use serde_json::Value;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Transcript context handed to the synthesis call, in bytes
const TRANSCRIPT_BUDGET: usize = 8000;

/// Rows listed per result in the plain-text fallback
const FALLBACK_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStatus {
    Answered,
    /// The user should rephrase or add detail
    NeedsRestatement,
    Failed,
}

/// Text shown to the user at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalAnswer {
    pub text: String,
    pub status: AnswerStatus,
}

impl FinalAnswer {
    pub fn answered(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: AnswerStatus::Answered,
        }
    }

    pub fn restate(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: AnswerStatus::NeedsRestatement,
        }
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: AnswerStatus::Failed,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.status == AnswerStatus::Answered
    }
}

pub struct Synthesizer {
    client: Arc<dyn LlmClient>,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Write the answer with the execution model, falling back to a plain
    /// summary of successful results. Never fails.
    #[instrument(skip_all, fields(model = %self.client.model_name(), entries = transcript.len()))]
    pub async fn synthesize(&self, request: &Request, transcript: &Transcript, dialogue_tool: Option<&str>) -> FinalAnswer {
        let mut prompt = request.render();
        if transcript.is_empty() {
            prompt.push_str("\n\nNo tools were run.");
        } else {
            prompt.push_str("\n\nTool results:\n");
            prompt.push_str(&transcript.to_context_json(TRANSCRIPT_BUDGET));
        }

        match self.client.chat(PromptBuilder::synthesizer().build_messages(prompt), None).await {
            Ok(result) => {
                if let Some(text) = result.text() {
                    info!(answer_len = text.len(), "Answer synthesized");
                    return FinalAnswer::answered(text);
                }
                warn!("Synthesis returned no text, using plain summary");
            }
            Err(e) => warn!(error = %e, "Synthesis call failed, using plain summary"),
        }

        match format_results(transcript, dialogue_tool) {
            Some(summary) => FinalAnswer::answered(summary),
            None => FinalAnswer::restate(RESTATE_MESSAGE),
        }
    }
}

/// Plain-text rendering of successful data results, or None when there are none
pub fn format_results(transcript: &Transcript, dialogue_tool: Option<&str>) -> Option<String> {
    let results: Vec<&ToolResult> = transcript
        .successful_results()
        .filter(|r| Some(r.tool.as_str()) != dialogue_tool)
        .collect();
    if results.is_empty() {
        return None;
    }

    let mut out = String::from("Here is what I found:\n");
    for result in results {
        let label = result
            .arguments
            .get("query")
            .and_then(Value::as_str)
            .map(|q| format!("{} ({})", result.tool, truncate(q, 80)))
            .unwrap_or_else(|| result.tool.clone());
        let _ = writeln!(out, "\n{}:", label);
        format_output(&mut out, &result.output);
    }
    Some(out.trim_end().to_string())
}

fn format_output(out: &mut String, output: &Value) {
    if let Some(hits) = output.get("results").and_then(Value::as_array) {
        for hit in hits {
            let title = hit.get("title").and_then(Value::as_str).unwrap_or("(untitled)");
            let _ = write!(out, "- {}", title);
            if let Some(snippet) = hit.get("snippet").and_then(Value::as_str).filter(|s| !s.is_empty()) {
                let _ = write!(out, ": {}", truncate(snippet, 160));
            }
            if let Some(link) = hit.get("link").and_then(Value::as_str) {
                let _ = write!(out, " <{}>", link);
            }
            out.push('\n');
        }
    } else if let Some(rows) = output.get("rows").and_then(Value::as_array) {
        for row in rows.iter().take(FALLBACK_ROWS) {
            let cells: Vec<String> = match row.as_object() {
                Some(map) => map.iter().map(|(k, v)| format!("{}: {}", k, scalar(v))).collect(),
                None => vec![scalar(row)],
            };
            let _ = writeln!(out, "- {}", cells.join(", "));
        }
        if rows.len() > FALLBACK_ROWS {
            let _ = writeln!(out, "- ... {} more rows", rows.len() - FALLBACK_ROWS);
        }
    } else {
        let _ = writeln!(out, "{}", truncate(&output.to_string(), 500));
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
