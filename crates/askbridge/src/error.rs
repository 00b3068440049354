// crates/askbridge/src/error.rs
// Standardized error types for askbridge
//
// Tool failures are not errors at this level: adapters return `ToolError`
// values that the executor records in the transcript.

use crate::prompts::FATAL_APOLOGY;
use thiserror::Error;

/// Main error type for the askbridge library
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The chat-completion API could not be reached or returned an error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// The planner produced output that could not be turned into a plan.
    #[error("planning failed: {0}")]
    Planning(String),
}

/// Convenience type alias for Result using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Whether this error ends the request instead of being recovered locally.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BridgeError::Llm(_))
    }

    /// Convert to a plain-language message safe to show to the end user.
    ///
    /// Transport and provider failures never leak their payloads here.
    pub fn to_user_string(&self) -> String {
        match self {
            BridgeError::Llm(_) => FATAL_APOLOGY.to_string(),
            BridgeError::Planning(_) => {
                "I couldn't work out how to answer that. Could you rephrase the question?"
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // BridgeError construction tests
    // ============================================================================

    #[test]
    fn test_llm_error() {
        let err = BridgeError::Llm("rate limited".to_string());
        assert!(err.to_string().contains("LLM error"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_planning_error() {
        let err = BridgeError::Planning("no JSON".to_string());
        assert_eq!(err.to_string(), "planning failed: no JSON");
    }

    // ============================================================================
    // Fatality classification
    // ============================================================================

    #[test]
    fn test_is_fatal() {
        assert!(BridgeError::Llm("down".into()).is_fatal());
        assert!(!BridgeError::Planning("bad".into()).is_fatal());
    }

    // ============================================================================
    // User-facing messages
    // ============================================================================

    #[test]
    fn test_user_string_hides_payload() {
        let err = BridgeError::Llm(r#"API error 500: {"error":{"message":"internal"}}"#.into());
        let msg = err.to_user_string();
        assert!(!msg.contains("500"));
        assert!(!msg.contains('{'));
        assert_eq!(msg, FATAL_APOLOGY);
    }

    #[test]
    fn test_user_string_for_planning() {
        let msg = BridgeError::Planning("expected value at line 1".into()).to_user_string();
        assert!(!msg.contains("line 1"));
        assert!(msg.contains("rephrase"));
    }
}
