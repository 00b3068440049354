// crates/askbridge/src/planner/mod.rs
// Planning phase: reasoning model turns a request into tool steps

pub mod plan;

pub use plan::{Plan, PlanRules, PlanStep, PlannerResponse};

use crate::error::{BridgeError, Result};
use crate::llm::LlmClient;
use crate::prompts::PromptBuilder;
use crate::request::Request;
use crate::tools::ToolCatalog;
use crate::transcript::Transcript;
use crate::utils::json::parse_json_with_retry;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Transcript context handed to the planner, in bytes
const TRANSCRIPT_BUDGET: usize = 6000;

pub struct Planner {
    client: Arc<dyn LlmClient>,
    catalog: Arc<ToolCatalog>,
    rules: PlanRules,
}

impl Planner {
    pub fn new(client: Arc<dyn LlmClient>, catalog: Arc<ToolCatalog>) -> Self {
        Self {
            client,
            catalog,
            rules: PlanRules::default(),
        }
    }

    fn build_prompt(&self, request: &Request, transcript: &Transcript) -> String {
        let mut prompt = format!(
            "Available tools:\n{}\n\n{}",
            self.catalog.describe_for_prompt(),
            request.render()
        );
        if transcript.tool_results().next().is_some() {
            prompt.push_str("\n\nTool results so far:\n");
            prompt.push_str(&transcript.to_context_json(TRANSCRIPT_BUDGET));
        }
        prompt
    }

    /// Produce the next plan.
    ///
    /// Returns `BridgeError::Llm` when the model cannot be reached and
    /// `BridgeError::Planning` when its output is unusable.
    #[instrument(skip_all, fields(model = %self.client.model_name(), clarifications = request.clarifications().len()))]
    pub async fn plan(&self, request: &Request, transcript: &Transcript) -> Result<Plan> {
        let messages = PromptBuilder::planner().build_single_message(self.build_prompt(request, transcript));

        let result = self
            .client
            .chat(messages, None)
            .await
            .map_err(|e| BridgeError::Llm(format!("{:#}", e)))?;

        let Some(content) = result.text() else {
            return Err(BridgeError::Planning("planner returned an empty response".into()));
        };
        debug!(content_len = content.len(), "Planner responded");

        let response: PlannerResponse = parse_json_with_retry(
            content,
            self.client.as_ref(),
            plan::RESPONSE_FORMAT,
            self.rules.json_fixes,
        )
        .await
        .map_err(BridgeError::Planning)?;

        let plan = plan::normalize(response, &self.catalog, self.rules)?;
        info!(
            steps = plan.len(),
            tools = ?plan.steps.iter().map(|s| s.tool.as_str()).collect::<Vec<_>>(),
            direct_answer = plan.final_response.is_some(),
            "Plan ready"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeTool, ScriptedLlm, ScriptedUser};
    use crate::tools::DialogueTool;
    use crate::transcript::ToolResult;
    use serde_json::json;

    fn catalog() -> Arc<ToolCatalog> {
        Arc::new(
            ToolCatalog::new()
                .with(Arc::new(FakeTool::new("web_search")))
                .with(Arc::new(DialogueTool::new(Arc::new(ScriptedUser::new(vec![]))))),
        )
    }

    #[tokio::test]
    async fn test_plan_dialogue_first() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"task_plan": {"phases": [{"operations": [{"type": "human_interaction", "parameters": {"question": "AAとは何ですか？"}}]}]}, "task_completed": false}"#,
        ]));
        let planner = Planner::new(llm.clone(), catalog());
        let plan = planner
            .plan(&Request::new("AAの曲名なんだったっけな"), &Transcript::new())
            .await
            .unwrap();
        assert!(plan.steps[0].is_dialogue());

        // Reasoning models get one user message containing the tool list
        let sent = llm.requests();
        assert_eq!(sent[0].len(), 1);
        let prompt = sent[0][0].content.clone().unwrap();
        assert!(prompt.contains("- web_search:"));
        assert!(prompt.contains("User request: AAの曲名なんだったっけな"));
    }

    #[tokio::test]
    async fn test_plan_includes_transcript() {
        let llm = Arc::new(ScriptedLlm::new(vec![r#"{"task_completed": true, "final_response": "done"}"#]));
        let planner = Planner::new(llm.clone(), catalog());
        let mut transcript = Transcript::new();
        transcript.record_tool(ToolResult::success(
            "web_search",
            json!({"query": "FF11"}),
            json!({"results": [{"title": "Fighters of the Crystal"}]}),
            1,
        ));
        let plan = planner.plan(&Request::new("q"), &transcript).await.unwrap();
        assert_eq!(plan.final_response.as_deref(), Some("done"));
        let prompt = llm.requests()[0][0].content.clone().unwrap();
        assert!(prompt.contains("Fighters of the Crystal"));
    }

    #[tokio::test]
    async fn test_plan_repairs_json_once() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            "I think we should search.",
            r#"{"current_phase": {"operations": [{"type": "web_search", "parameters": {"query": "FF11"}}]}}"#,
        ]));
        let plan = Planner::new(llm.clone(), catalog())
            .plan(&Request::new("q"), &Transcript::new())
            .await
            .unwrap();
        assert_eq!(plan.steps[0].tool, "web_search");
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_is_planning_failure() {
        let llm = Arc::new(ScriptedLlm::new(vec!["not json", "still not json"]));
        let err = Planner::new(llm, catalog())
            .plan(&Request::new("q"), &Transcript::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Planning(_)));
    }

    #[tokio::test]
    async fn test_transport_error_is_llm_error() {
        let llm = Arc::new(ScriptedLlm::failing());
        let err = Planner::new(llm, catalog())
            .plan(&Request::new("q"), &Transcript::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Llm(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_blank_response_is_planning_failure() {
        let llm = Arc::new(ScriptedLlm::new(vec!["   "]));
        let err = Planner::new(llm, catalog())
            .plan(&Request::new("q"), &Transcript::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Planning(_)));
    }
}
