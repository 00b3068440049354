// crates/askbridge/src/orchestrator.rs
// Bounded plan → execute → clarify → synthesize state machine

use crate::error::BridgeError;
use crate::executor::{Executor, ModelBudget};
use crate::llm::LlmClient;
use crate::planner::{Plan, PlanStep, Planner};
use crate::prompts::{
    DEFAULT_CLARIFY_QUESTION, NO_DIALOGUE_MESSAGE, NO_RESULTS_QUESTION, RESTATE_MESSAGE,
    tool_failure_message,
};
use crate::request::Request;
use crate::tools::{ToolCatalog, ToolErrorKind, ToolKind, string_arg};
use crate::transcript::Transcript;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub use crate::synthesis::{AnswerStatus, FinalAnswer, Synthesizer};

// ═══════════════════════════════════════════════════════════════════════════════
// States and limits
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Received,
    Planning,
    Executing,
    ClarifyLoop,
    Synthesizing,
    Done,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoopState::Received => "received",
            LoopState::Planning => "planning",
            LoopState::Executing => "executing",
            LoopState::ClarifyLoop => "clarify_loop",
            LoopState::Synthesizing => "synthesizing",
            LoopState::Done => "done",
        };
        f.write_str(s)
    }
}

/// Bounds applied to every run
#[derive(Debug, Clone, PartialEq)]
pub struct LoopLimits {
    /// Planning, Executing and ClarifyLoop entries combined
    pub max_phases: u32,
    pub max_clarifications: u32,
    /// Extra attempts for an `Unavailable` data tool
    pub tool_retries: u32,
    pub executor_model_calls: u32,
    pub tool_timeout: Duration,
}

impl Default for LoopLimits {
    fn default() -> Self {
        Self {
            max_phases: 8,
            max_clarifications: 3,
            tool_retries: 1,
            executor_model_calls: 3,
            tool_timeout: Duration::from_secs(30),
        }
    }
}

/// Report handed back when a run reaches `Done`
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub answer: FinalAnswer,
    pub transcript: Transcript,
    pub phases_used: u32,
    pub clarifications: u32,
    /// Every state visited, in order
    pub trace: Vec<LoopState>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Per-run state
// ═══════════════════════════════════════════════════════════════════════════════

/// Where the loop goes next
enum Next {
    Plan,
    Execute(Plan),
    Clarify(String),
}

/// How the run ends
#[derive(Debug)]
enum Ending {
    /// Synthesize from whatever the transcript holds
    Synthesize,
    Direct(String),
    ToolUnavailable(String),
    /// Bounds hit with nothing usable
    Restate,
    NoDialogue,
    Fatal(BridgeError),
}

/// Result of running one plan
enum PlanOutcome {
    /// At least one step returned data; the planner decides what follows
    Collected,
    Clarify(String),
    Unavailable(String),
}

/// Result of one clarification round
enum ClarifyOutcome {
    Answered(String),
    Blank,
    Closed(String),
}

struct Run {
    request: Request,
    transcript: Transcript,
    budget: ModelBudget,
    phases: u32,
    clarifications: u32,
    trace: Vec<LoopState>,
}

impl Run {
    fn enter(&mut self, state: LoopState) {
        info!(state = %state, phase = self.phases, "Loop state");
        self.trace.push(state);
    }

    /// Count a phase; false when the bound is already reached
    fn begin_phase(&mut self, state: LoopState, max_phases: u32) -> bool {
        if self.phases >= max_phases {
            warn!(max_phases, next = %state, "Phase limit reached");
            return false;
        }
        self.phases += 1;
        self.enter(state);
        true
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Orchestrator
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Orchestrator {
    planner: Planner,
    executor: Executor,
    synthesizer: Synthesizer,
    catalog: Arc<ToolCatalog>,
    limits: LoopLimits,
}

impl Orchestrator {
    pub fn new(
        planner: Planner,
        executor: Executor,
        synthesizer: Synthesizer,
        catalog: Arc<ToolCatalog>,
        limits: LoopLimits,
    ) -> Self {
        Self {
            planner,
            executor,
            synthesizer,
            catalog,
            limits,
        }
    }

    /// Wire the planning model and the execution model to a catalog.
    /// The execution model also writes the final answer.
    pub fn with_models(
        planner_llm: Arc<dyn LlmClient>,
        executor_llm: Arc<dyn LlmClient>,
        catalog: Arc<ToolCatalog>,
        limits: LoopLimits,
    ) -> Self {
        Self::new(
            Planner::new(planner_llm, catalog.clone()),
            Executor::new(executor_llm.clone(), catalog.clone(), &limits),
            Synthesizer::new(executor_llm),
            catalog,
            limits,
        )
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn limits(&self) -> &LoopLimits {
        &self.limits
    }

    /// Run one request to `Done`. Every failure becomes part of the answer.
    #[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
    pub async fn run(&self, request: Request) -> RunOutcome {
        let mut run = Run {
            request,
            transcript: Transcript::new(),
            budget: ModelBudget::new(self.limits.executor_model_calls),
            phases: 0,
            clarifications: 0,
            trace: Vec::new(),
        };
        run.enter(LoopState::Received);

        let ending = self.drive(&mut run).await;

        // A fatal error short-circuits straight to Done
        if !matches!(ending, Ending::Fatal(_)) {
            run.enter(LoopState::Synthesizing);
        }
        let answer = self.finish(ending, &run).await;
        run.enter(LoopState::Done);
        info!(
            status = ?answer.status,
            phases = run.phases,
            clarifications = run.clarifications,
            "Run complete"
        );

        RunOutcome {
            answer,
            transcript: run.transcript,
            phases_used: run.phases,
            clarifications: run.clarifications,
            trace: run.trace,
        }
    }

    async fn drive(&self, run: &mut Run) -> Ending {
        let mut next = Next::Plan;
        loop {
            next = match next {
                Next::Plan => {
                    if !run.begin_phase(LoopState::Planning, self.limits.max_phases) {
                        return self.out_of_bounds(run);
                    }
                    if run.request.is_blank() {
                        info!("Blank request, nothing to plan");
                        return Ending::Restate;
                    }
                    match self.planner.plan(&run.request, &run.transcript).await {
                        Ok(plan) if plan.is_empty() => {
                            return match plan.final_response {
                                Some(text) => Ending::Direct(text),
                                None => Ending::Synthesize,
                            };
                        }
                        Ok(plan) => Next::Execute(plan),
                        Err(e) if e.is_fatal() => return Ending::Fatal(e),
                        Err(e) if self.has_data(run) => {
                            warn!(error = %e, "Re-planning failed, answering from collected results");
                            return Ending::Synthesize;
                        }
                        Err(e) => {
                            warn!(error = %e, "Planning failed, asking the user instead");
                            Next::Clarify(DEFAULT_CLARIFY_QUESTION.to_string())
                        }
                    }
                }
                Next::Execute(plan) => {
                    if !run.begin_phase(LoopState::Executing, self.limits.max_phases) {
                        return self.out_of_bounds(run);
                    }
                    match self.execute_plan(plan, run).await {
                        Ok(PlanOutcome::Collected) => Next::Plan,
                        Ok(PlanOutcome::Clarify(question)) => Next::Clarify(question),
                        Ok(PlanOutcome::Unavailable(tool)) => return Ending::ToolUnavailable(tool),
                        Err(e) => return Ending::Fatal(e),
                    }
                }
                Next::Clarify(question) => {
                    if run.clarifications >= self.limits.max_clarifications {
                        warn!(rounds = run.clarifications, "Clarification limit reached");
                        return self.out_of_bounds(run);
                    }
                    if !run.begin_phase(LoopState::ClarifyLoop, self.limits.max_phases) {
                        return self.out_of_bounds(run);
                    }
                    run.clarifications += 1;
                    match self.clarify(&question, run).await {
                        Ok(ClarifyOutcome::Answered(answer)) => {
                            run.request = run.request.with_clarification(question, answer);
                            Next::Plan
                        }
                        Ok(ClarifyOutcome::Blank) => Next::Clarify(question),
                        Ok(ClarifyOutcome::Closed(tool)) => return Ending::ToolUnavailable(tool),
                        Err(e) => return e,
                    }
                }
            };
        }
    }

    /// Run plan steps in order until one needs the user or breaks
    async fn execute_plan(&self, plan: Plan, run: &mut Run) -> crate::Result<PlanOutcome> {
        let mut successes = 0usize;
        for step in plan.steps {
            if step.is_dialogue() {
                let question = string_arg(&step.arguments, "question").unwrap_or(DEFAULT_CLARIFY_QUESTION);
                return Ok(PlanOutcome::Clarify(question.to_string()));
            }

            let result = self
                .executor
                .execute_step(&step, &run.request, &mut run.transcript, &mut run.budget)
                .await?;

            if result.success {
                successes += 1;
            } else if result.failed_with(ToolErrorKind::EmptyResult) {
                return Ok(PlanOutcome::Clarify(NO_RESULTS_QUESTION.to_string()));
            } else if result.failed_with(ToolErrorKind::Unavailable) {
                return Ok(PlanOutcome::Unavailable(result.tool));
            }
        }

        if successes > 0 {
            Ok(PlanOutcome::Collected)
        } else {
            warn!("No step in the plan succeeded");
            Ok(PlanOutcome::Clarify(DEFAULT_CLARIFY_QUESTION.to_string()))
        }
    }

    /// Ask one question through the dialogue tool
    async fn clarify(&self, question: &str, run: &mut Run) -> Result<ClarifyOutcome, Ending> {
        let Some(dialogue) = self.catalog.dialogue() else {
            return Err(Ending::NoDialogue);
        };
        let step = PlanStep {
            tool: dialogue.descriptor().name.clone(),
            arguments: json!({ "question": question }),
            description: "clarify the request".to_string(),
            kind: ToolKind::Dialogue,
        };

        run.transcript.record_question(question);
        let result = self
            .executor
            .execute_step(&step, &run.request, &mut run.transcript, &mut run.budget)
            .await
            .map_err(Ending::Fatal)?;

        if result.success
            && let Some(answer) = result.output.get("answer").and_then(Value::as_str)
        {
            run.transcript.record_answer(answer);
            return Ok(ClarifyOutcome::Answered(answer.to_string()));
        }
        if result.failed_with(ToolErrorKind::Unavailable) {
            return Ok(ClarifyOutcome::Closed(result.tool));
        }
        info!("Blank clarification, asking again");
        Ok(ClarifyOutcome::Blank)
    }

    /// Ending once a bound is hit
    fn out_of_bounds(&self, run: &Run) -> Ending {
        if self.has_data(run) {
            Ending::Synthesize
        } else {
            Ending::Restate
        }
    }

    fn has_data(&self, run: &Run) -> bool {
        run.transcript.has_successful_data(self.dialogue_name().as_deref())
    }

    fn dialogue_name(&self) -> Option<String> {
        self.catalog.dialogue().map(|d| d.descriptor().name.clone())
    }

    async fn finish(&self, ending: Ending, run: &Run) -> FinalAnswer {
        match ending {
            Ending::Synthesize => {
                self.synthesizer
                    .synthesize(&run.request, &run.transcript, self.dialogue_name().as_deref())
                    .await
            }
            Ending::Direct(text) => FinalAnswer::answered(text),
            Ending::ToolUnavailable(tool) => FinalAnswer::failed(tool_failure_message(&tool)),
            Ending::Restate => FinalAnswer::restate(RESTATE_MESSAGE),
            Ending::NoDialogue => FinalAnswer::restate(NO_DIALOGUE_MESSAGE),
            Ending::Fatal(e) => {
                warn!(error = %e, "Run aborted");
                FinalAnswer::failed(e.to_user_string())
            }
        }
    }
}
