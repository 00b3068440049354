// crates/askbridge/src/cli/chat.rs
// Interactive session loop

use super::clients::build_orchestrator;
use anyhow::{Result, bail};
use askbridge::config::Config;
use askbridge::session::{Session, is_quit};
use askbridge::tools::{TerminalChannel, UserChannel};
use tracing::debug;

pub async fn run_chat(config: Config) -> Result<()> {
    let validation = config.validate();
    if !validation.is_valid() {
        bail!("{}\nRun `askbridge check` for details.", validation.report());
    }

    let orchestrator = build_orchestrator(&config);
    let terminal = TerminalChannel;
    let mut session = Session::new();
    println!("askbridge ready. Type 'quit' to exit.");

    loop {
        if !session.is_empty() {
            println!("\n--- conversation so far ---\n{}\n---------------------------", session.summary());
        }

        let Some(input) = terminal.ask("What would you like to know?").await? else {
            break;
        };
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if is_quit(input) {
            break;
        }

        let outcome = orchestrator.run(session.request(input)).await;
        debug!(
            answered = outcome.answer.is_answered(),
            phases = outcome.phases_used,
            clarifications = outcome.clarifications,
            entries = outcome.transcript.len(),
            "Request finished"
        );
        println!("\n{}", outcome.answer.text);
        session.record(input, outcome.answer.text);
    }

    println!("Bye.");
    Ok(())
}
