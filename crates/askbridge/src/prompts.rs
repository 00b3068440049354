// crates/askbridge/src/prompts.rs
// Prompt text for the planning, execution and synthesis calls

use crate::llm::Message;

/// Shared prefix for every prompt
const STATIC_PREFIX: &str = r#"You are askbridge, an assistant that answers questions by planning and running tool calls.
Core principles:
- Answer in the same language the user wrote in
- Prefer facts returned by tools over your own memory
- When the request is ambiguous, ask one short clarifying question instead of guessing
- Never invent tool results"#;

const PLANNER_INSTRUCTIONS: &str = r#"You are the planner. Break the user's request into phases of tool operations.

Rules:
1. At most 3 operations per phase.
2. Use human_interaction alone in its own phase, and put it first when the request is ambiguous
   (unknown abbreviations, missing subject, several plausible meanings).
3. At most 5 phases.
4. Only use tools from the list below. Use exactly the parameter names they declare.
5. web_search num_results must be between 1 and 10.
6. If the tool results and clarifications already answer the request, set "task_completed": true
   and leave the phases empty. Write the answer in "final_response", or leave it null to have the
   tool results summarised.
7. If the results so far are not enough, plan only the next phase that would close the gap.

Respond with ONLY a JSON object in this format:
{
  "task_plan": {
    "overall_tasks": ["short description of each sub-task"],
    "total_phases": 1,
    "phases": [
      {
        "phase_number": 1,
        "operations": [
          {"type": "tool_name", "parameters": {"param": "value"}}
        ],
        "description": "what this phase does"
      }
    ]
  },
  "needs_tool": true,
  "task_completed": false,
  "final_response": null
}"#;

const EXECUTOR_INSTRUCTIONS: &str = r#"You are the executor. Carry out exactly one planned step by calling the single tool provided.
Use the planned arguments, refining them only when the earlier results or schema show they need fixing
(e.g. correcting a table or column name, or adding a distinguishing keyword to a search).
Call the tool; do not answer in prose."#;

const SYNTHESIS_INSTRUCTIONS: &str = r#"You write the final answer. Use only the tool results and clarifications provided.
Be concise and direct. Name the specific facts the results support (titles, numbers, names).
If the results do not answer the question, say so plainly and suggest what the user could clarify."#;

/// Asked when the planner's output cannot be used
pub const DEFAULT_CLARIFY_QUESTION: &str =
    "Could you tell me more specifically what you're looking for?";

/// Asked when a lookup came back empty
pub const NO_RESULTS_QUESTION: &str = "I couldn't find anything for that. \
     Could you add a detail or two, such as the full name or where it comes from?";

/// Final answer when clarification rounds or phases run out without data
pub const RESTATE_MESSAGE: &str = "I'm sorry, I still couldn't work out what you're looking for. \
     Could you restate your question with a little more detail?";

/// Final answer when the model service fails mid-request
pub const FATAL_APOLOGY: &str =
    "Sorry, I couldn't reach the language model service right now. Please try again in a moment.";

/// Final answer when no dialogue channel exists to ask for clarification
pub const NO_DIALOGUE_MESSAGE: &str = "I couldn't find an answer, and I have no way to ask you for more details. \
     Could you rephrase your question?";

/// Graceful failure answer naming the capability that broke
pub fn tool_failure_message(tool: &str) -> String {
    let capability = match tool {
        "web_search" => "web search",
        "database_query" => "the database",
        "human_interaction" => "the conversation channel",
        other => other,
    };
    format!(
        "I'm sorry, I couldn't complete your request because {} is unavailable right now. \
         Please try again later.",
        capability
    )
}

/// Builds the message list for each role
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    role_instructions: &'static str,
}

impl PromptBuilder {
    pub fn planner() -> Self {
        Self {
            role_instructions: PLANNER_INSTRUCTIONS,
        }
    }

    pub fn executor() -> Self {
        Self {
            role_instructions: EXECUTOR_INSTRUCTIONS,
        }
    }

    pub fn synthesizer() -> Self {
        Self {
            role_instructions: SYNTHESIS_INSTRUCTIONS,
        }
    }

    pub fn build_system_prompt(&self) -> String {
        format!("{}\n\n{}", STATIC_PREFIX, self.role_instructions)
    }

    /// System + user pair
    pub fn build_messages(&self, user_content: impl Into<String>) -> Vec<Message> {
        vec![
            Message::system(self.build_system_prompt()),
            Message::user(user_content),
        ]
    }

    /// Single user message; reasoning models reject the system role
    pub fn build_single_message(&self, user_content: impl AsRef<str>) -> Vec<Message> {
        vec![Message::user(format!(
            "{}\n\n---\n\n{}",
            self.build_system_prompt(),
            user_content.as_ref()
        ))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_has_prefix_and_role() {
        let prompt = PromptBuilder::planner().build_system_prompt();
        assert!(prompt.starts_with("You are askbridge"));
        assert!(prompt.contains("At most 3 operations per phase"));
        assert!(prompt.contains("\"task_plan\""));
    }

    #[test]
    fn test_build_messages() {
        let msgs = PromptBuilder::synthesizer().build_messages("results");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, "system");
        assert_eq!(msgs[1].content.as_deref(), Some("results"));
    }

    #[test]
    fn test_single_message() {
        let msgs = PromptBuilder::planner().build_single_message("User request: AA");
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, "user");
        assert!(msgs[0].content.as_deref().unwrap().ends_with("User request: AA"));
    }

    #[test]
    fn test_tool_failure_message() {
        let msg = tool_failure_message("database_query");
        assert!(msg.contains("the database"));
        assert!(msg.starts_with("I'm sorry"));
        assert!(tool_failure_message("weather").contains("weather"));
    }
}
