// crates/askbridge/src/cli/ask.rs
// One-shot question

use super::clients::build_orchestrator;
use anyhow::{Result, bail};
use askbridge::Request;
use askbridge::config::Config;

pub async fn run_ask(config: Config, prompt: Vec<String>) -> Result<()> {
    let validation = config.validate();
    if !validation.is_valid() {
        bail!("{}\nRun `askbridge check` for details.", validation.report());
    }

    let orchestrator = build_orchestrator(&config);
    let outcome = orchestrator.run(Request::new(prompt.join(" "))).await;
    println!("{}", outcome.answer.text);
    Ok(())
}
