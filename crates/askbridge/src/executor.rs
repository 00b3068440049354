// crates/askbridge/src/executor.rs
// Execution phase: run one planned step against its tool adapter

use crate::error::{BridgeError, Result};
use crate::llm::LlmClient;
use crate::orchestrator::LoopLimits;
use crate::planner::PlanStep;
use crate::prompts::PromptBuilder;
use crate::request::Request;
use crate::tools::{ToolAdapter, ToolCatalog, ToolError, ToolKind, sanitize_tool_name};
use crate::transcript::{ToolResult, Transcript};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Transcript context handed to the execution model, in bytes
const TRANSCRIPT_BUDGET: usize = 4000;

/// Execution-model calls left for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelBudget {
    remaining: u32,
}

impl ModelBudget {
    pub fn new(calls: u32) -> Self {
        Self { remaining: calls }
    }

    /// Consume one call; false once exhausted
    pub fn try_take(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

pub struct Executor {
    client: Arc<dyn LlmClient>,
    catalog: Arc<ToolCatalog>,
    retries: u32,
    timeout: Duration,
}

impl Executor {
    pub fn new(client: Arc<dyn LlmClient>, catalog: Arc<ToolCatalog>, limits: &LoopLimits) -> Self {
        Self {
            client,
            catalog,
            retries: limits.tool_retries,
            timeout: limits.tool_timeout,
        }
    }

    /// Run one step and append every attempt to the transcript.
    ///
    /// Adapter failures come back as an unsuccessful [`ToolResult`]; only an
    /// unreachable execution model is an `Err`.
    #[instrument(skip_all, fields(tool = %step.tool))]
    pub async fn execute_step(
        &self,
        step: &PlanStep,
        request: &Request,
        transcript: &mut Transcript,
        budget: &mut ModelBudget,
    ) -> Result<ToolResult> {
        let Some(adapter) = self.catalog.get(&step.tool) else {
            warn!("Step names an unregistered tool");
            let result = ToolResult::failure(&step.tool, step.arguments.clone(), &ToolError::unknown(&step.tool), 1);
            transcript.record_tool(result.clone());
            return Ok(result);
        };
        let descriptor = adapter.descriptor();
        let is_data = descriptor.kind == ToolKind::Data;

        let arguments = if is_data && budget.try_take() {
            self.refine_arguments(adapter.as_ref(), step, request, transcript).await?
        } else {
            step.arguments.clone()
        };

        if let Some(missing) = descriptor.missing_required(&arguments) {
            let err = ToolError::invalid(format!("missing required parameter '{}'", missing));
            warn!(error = %err, "Skipping invocation");
            let result = ToolResult::failure(&descriptor.name, arguments, &err, 1);
            transcript.record_tool(result.clone());
            return Ok(result);
        }

        // Dialogue steps are never retried: a closed channel stays closed
        let max_attempts = if is_data { 1 + self.retries } else { 1 };
        let mut attempt = 1;
        loop {
            let outcome = if is_data {
                self.invoke_with_timeout(adapter.as_ref(), &arguments).await
            } else {
                adapter.invoke(&arguments).await
            };
            let result = ToolResult::from_outcome(&descriptor.name, arguments.clone(), &outcome, attempt);
            transcript.record_tool(result.clone());

            match outcome {
                Ok(_) => {
                    info!(attempt, "Tool succeeded");
                    return Ok(result);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(attempt, error = %e, "Tool unavailable, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Tool failed");
                    return Ok(result);
                }
            }
        }
    }

    async fn invoke_with_timeout(
        &self,
        adapter: &dyn ToolAdapter,
        arguments: &Value,
    ) -> std::result::Result<Value, ToolError> {
        match tokio::time::timeout(self.timeout, adapter.invoke(arguments)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolError::unavailable(format!(
                "timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }

    /// Let the function-calling model adjust the planned arguments
    async fn refine_arguments(
        &self,
        adapter: &dyn ToolAdapter,
        step: &PlanStep,
        request: &Request,
        transcript: &Transcript,
    ) -> Result<Value> {
        let descriptor = adapter.descriptor();
        let mut prompt = format!(
            "{}\n\nPlanned step: {}\nTool: {}\nPlanned arguments: {}",
            request.render(),
            if step.description.is_empty() { "(none)" } else { step.description.as_str() },
            descriptor.name,
            step.arguments
        );
        if let Some(context) = adapter.prompt_context().await {
            prompt.push_str("\n\n");
            prompt.push_str(&context);
        }
        if !transcript.is_empty() {
            prompt.push_str("\n\nResults so far:\n");
            prompt.push_str(&transcript.to_context_json(TRANSCRIPT_BUDGET));
        }

        let result = self
            .client
            .chat(
                PromptBuilder::executor().build_messages(prompt),
                Some(vec![descriptor.to_llm_tool()]),
            )
            .await
            .map_err(|e| BridgeError::Llm(format!("{:#}", e)))?;

        let refined = result
            .tool_calls
            .iter()
            .flatten()
            .filter(|call| sanitize_tool_name(&call.function.name) == descriptor.name)
            .find_map(|call| call.function.parsed_arguments());

        match refined {
            Some(map) => {
                let refined = Value::Object(map);
                debug!(arguments = %refined, "Executor refined arguments");
                Ok(refined)
            }
            None => {
                debug!("Executor made no usable tool call, keeping planned arguments");
                Ok(step.arguments.clone())
            }
        }
    }
}
