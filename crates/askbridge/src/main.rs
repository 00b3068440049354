// crates/askbridge/src/main.rs
// askbridge - plan-and-execute question answering CLI

mod cli;

use anyhow::Result;
use askbridge::config::Config;
use clap::Parser;
use cli::{Cli, Commands};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn log_level(verbose: u8) -> Level {
    if let Some(level) = std::env::var("ASKBRIDGE_LOG")
        .ok()
        .and_then(|v| v.trim().parse::<Level>().ok())
    {
        return level;
    }
    match verbose {
        0 => Level::WARN, // stdout is the conversation
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (global first, then project)
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".askbridge/.env"));
    }
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load(cli.db);

    match cli.command {
        None | Some(Commands::Chat) => cli::run_chat(config).await?,
        Some(Commands::Ask { prompt }) => cli::run_ask(config, prompt).await?,
        Some(Commands::Check) => cli::run_check(config)?,
    }

    Ok(())
}
