// crates/askbridge/src/cli/check.rs
// Configuration report

use super::clients::build_catalog;
use anyhow::{Result, bail};
use askbridge::config::{Config, FileConfig};
use askbridge::tools::TerminalChannel;
use std::sync::Arc;

pub fn run_check(config: Config) -> Result<()> {
    println!("Config file: {}", FileConfig::config_path().display());
    println!("Planner:     {} @ {}", config.planner.model, config.planner.base_url);
    println!("Executor:    {} @ {}", config.executor.model, config.executor.base_url);
    println!("Database:    {}", config.database.path.display());
    println!(
        "Limits:      {} phases, {} clarifications, {} retries, {} executor calls, {}s tool timeout",
        config.limits.max_phases,
        config.limits.max_clarifications,
        config.limits.tool_retries,
        config.limits.executor_model_calls,
        config.limits.tool_timeout.as_secs()
    );

    let catalog = build_catalog(&config, Arc::new(TerminalChannel));
    println!("Tools:       {}", catalog.names().join(", "));

    let validation = config.validate();
    println!("\n{}", validation.report());
    if !validation.is_valid() {
        bail!("configuration has errors");
    }
    Ok(())
}
