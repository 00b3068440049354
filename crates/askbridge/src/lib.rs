// crates/askbridge/src/lib.rs
// askbridge - plan-and-execute question answering over tools

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod error;
pub mod executor;
pub mod llm;
pub mod orchestrator;
pub mod planner;
pub mod prompts;
pub mod request;
pub mod session;
pub mod synthesis;
pub mod tools;
pub mod transcript;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{BridgeError, Result};
pub use orchestrator::{FinalAnswer, LoopLimits, LoopState, Orchestrator, RunOutcome};
pub use request::Request;
