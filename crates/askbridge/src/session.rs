// crates/askbridge/src/session.rs
// Rolling conversation context for the interactive session

use crate::request::Request;
use crate::utils::truncate;
use std::collections::VecDeque;

/// Exchanges kept for follow-up questions
pub const HISTORY_SIZE: usize = 5;

/// Per-answer cap inside the summary, in bytes
const ANSWER_CHARS: usize = 300;

/// Strings that end the interactive session
const QUIT_SENTINELS: [&str; 3] = ["quit", "exit", "q"];

pub fn is_quit(input: &str) -> bool {
    let input = input.trim();
    QUIT_SENTINELS.iter().any(|s| input.eq_ignore_ascii_case(s))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Exchange {
    question: String,
    answer: String,
}

/// Last few question/answer pairs of one interactive session
#[derive(Debug, Clone, Default)]
pub struct Session {
    history: VecDeque<Exchange>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        if self.history.len() == HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(Exchange {
            question: question.into(),
            answer: answer.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Oldest first; empty when nothing has been asked yet
    pub fn summary(&self) -> String {
        self.history
            .iter()
            .map(|e| format!("Q: {}\nA: {}", e.question, truncate(&e.answer, ANSWER_CHARS)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// New request carrying the session summary
    pub fn request(&self, text: &str) -> Request {
        Request::new(text).with_context(self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_sentinels() {
        assert!(is_quit("quit"));
        assert!(is_quit(" EXIT "));
        assert!(is_quit("Q"));
        assert!(!is_quit("quite"));
        assert!(!is_quit("AAの曲名"));
    }

    #[test]
    fn test_keeps_last_five() {
        let mut s = Session::new();
        for i in 0..7 {
            s.record(format!("q{}", i), format!("a{}", i));
        }
        assert_eq!(s.len(), HISTORY_SIZE);
        let summary = s.summary();
        assert!(summary.starts_with("Q: q2\nA: a2"));
        assert!(summary.ends_with("Q: q6\nA: a6"));
        assert!(!summary.contains("q1"));
    }

    #[test]
    fn test_request_context() {
        let mut s = Session::new();
        assert!(s.request("hi").context().is_none());

        s.record("AAの曲名なんだったっけな", "Fighters of the Crystal です。");
        let r = s.request("作曲者は？");
        assert_eq!(r.original(), "作曲者は？");
        assert!(r.context().unwrap().contains("Fighters of the Crystal"));
    }

    #[test]
    fn test_long_answers_truncated() {
        let mut s = Session::new();
        s.record("q", "x".repeat(1000));
        assert!(s.summary().len() < 320);
    }
}
