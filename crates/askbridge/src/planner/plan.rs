// crates/askbridge/src/planner/plan.rs
// Planner response types and normalization into an executable plan

use crate::error::{BridgeError, Result};
use crate::tools::{ToolCatalog, ToolKind, sanitize_tool_name};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

// ═══════════════════════════════════════════════════════════════════════════════
// Wire format
// ═══════════════════════════════════════════════════════════════════════════════

/// JSON object the planning model is asked to return
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerResponse {
    #[serde(default)]
    pub task_plan: Option<TaskPlan>,
    /// Some models return only the phase they want run next
    #[serde(default)]
    pub current_phase: Option<TaskPhase>,
    #[serde(default)]
    pub needs_tool: Option<bool>,
    #[serde(default)]
    pub task_completed: bool,
    #[serde(default)]
    pub final_response: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPlan {
    #[serde(default)]
    pub overall_tasks: Vec<String>,
    #[serde(default)]
    pub total_phases: Option<u32>,
    #[serde(default)]
    pub phases: Vec<TaskPhase>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPhase {
    #[serde(default)]
    pub phase_number: Option<u32>,
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "type", alias = "tool")]
    pub tool: String,
    #[serde(default, alias = "arguments")]
    pub parameters: Value,
}

/// Compact description used when asking the model to repair broken JSON
pub const RESPONSE_FORMAT: &str = r#"{"task_plan": {"overall_tasks": [string], "total_phases": number, "phases": [{"phase_number": number, "operations": [{"type": string, "parameters": object}], "description": string}]}, "needs_tool": bool, "task_completed": bool, "final_response": string|null}"#;

// ═══════════════════════════════════════════════════════════════════════════════
// Executable plan
// ═══════════════════════════════════════════════════════════════════════════════

/// One tool invocation the executor should run
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    pub tool: String,
    pub arguments: Value,
    pub description: String,
    pub kind: ToolKind,
}

impl PlanStep {
    pub fn is_dialogue(&self) -> bool {
        self.kind == ToolKind::Dialogue
    }
}

/// Ordered steps for one planning phase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
    pub overall_tasks: Vec<String>,
    /// Direct answer when the planner considers the task complete
    pub final_response: Option<String>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

/// Structural limits applied to every plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanRules {
    pub max_phases: usize,
    pub max_ops_per_phase: usize,
    /// Repair attempts when the model returns unparseable JSON
    pub json_fixes: u32,
}

impl Default for PlanRules {
    fn default() -> Self {
        Self {
            max_phases: 5,
            max_ops_per_phase: 3,
            json_fixes: 1,
        }
    }
}

/// Turn a parsed response into a plan the executor can run.
///
/// Unknown tools are dropped. If the model proposed operations and none
/// survive, that is a planning failure rather than an empty plan.
pub fn normalize(response: PlannerResponse, catalog: &ToolCatalog, rules: PlanRules) -> Result<Plan> {
    let final_response = response
        .final_response
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let (overall_tasks, phases) = match response.task_plan {
        Some(plan) if !plan.phases.is_empty() => (plan.overall_tasks, plan.phases),
        Some(plan) => (plan.overall_tasks, response.current_phase.into_iter().collect()),
        None => (Vec::new(), response.current_phase.into_iter().collect()),
    };

    if response.task_completed && final_response.is_some() {
        return Ok(Plan {
            steps: Vec::new(),
            overall_tasks,
            final_response,
        });
    }

    if phases.len() > rules.max_phases {
        warn!(phases = phases.len(), max = rules.max_phases, "Plan has too many phases, truncating");
    }

    let mut steps = Vec::new();
    let mut proposed = 0usize;
    'phases: for phase in phases.into_iter().take(rules.max_phases) {
        if phase.operations.len() > rules.max_ops_per_phase {
            warn!(
                phase = ?phase.phase_number,
                operations = phase.operations.len(),
                "Phase has too many operations, truncating"
            );
        }
        for op in phase.operations.into_iter().take(rules.max_ops_per_phase) {
            proposed += 1;
            let name = sanitize_tool_name(&op.tool);
            let Some(adapter) = catalog.get(&name) else {
                warn!(tool = %op.tool, "Planner proposed an unavailable tool, dropping step");
                continue;
            };

            let kind = adapter.descriptor().kind;
            steps.push(PlanStep {
                tool: name,
                arguments: object_arguments(op.parameters),
                description: phase.description.clone(),
                kind,
            });

            // A question forces a re-plan once answered
            if kind == ToolKind::Dialogue {
                break 'phases;
            }
        }
    }

    if proposed > 0 && steps.is_empty() {
        return Err(BridgeError::Planning(
            "none of the proposed tools are available".to_string(),
        ));
    }

    Ok(Plan {
        steps,
        overall_tasks,
        final_response,
    })
}

fn object_arguments(parameters: Value) -> Value {
    match parameters {
        Value::Object(_) => parameters,
        Value::Null => Value::Object(Map::new()),
        other => {
            warn!(parameters = %other, "Non-object tool parameters, ignoring");
            Value::Object(Map::new())
        }
    }
}
