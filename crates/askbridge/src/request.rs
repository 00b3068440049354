// crates/askbridge/src/request.rs
// Immutable user request, augmented by clarification rounds

use std::fmt::Write;

/// One answered clarifying question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clarification {
    pub question: String,
    pub answer: String,
}

/// The user's question plus everything learned about it so far.
///
/// Never mutated in place: [`Request::with_clarification`] returns a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    original: String,
    /// Summary of earlier exchanges in the same session
    context: Option<String>,
    clarifications: Vec<Clarification>,
}

impl Request {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            original: text.into().trim().to_string(),
            context: None,
            clarifications: Vec::new(),
        }
    }

    /// Attach session context; blank context is ignored
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = (!context.trim().is_empty()).then_some(context);
        self
    }

    /// New request carrying one more clarification
    pub fn with_clarification(&self, question: impl Into<String>, answer: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.clarifications.push(Clarification {
            question: question.into(),
            answer: answer.into(),
        });
        next
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn clarifications(&self) -> &[Clarification] {
        &self.clarifications
    }

    pub fn is_blank(&self) -> bool {
        self.original.is_empty()
    }

    /// Prompt rendering: context, original question, then clarifications in order
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(ctx) = &self.context {
            let _ = writeln!(out, "Previous conversation:\n{}\n", ctx);
        }
        let _ = writeln!(out, "User request: {}", self.original);
        if !self.clarifications.is_empty() {
            out.push_str("\nClarifications from the user:\n");
            for (i, c) in self.clarifications.iter().enumerate() {
                let _ = writeln!(out, "{}. Q: {}\n   A: {}", i + 1, c.question, c.answer);
            }
        }
        out.trim_end().to_string()
    }
}
