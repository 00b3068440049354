// crates/askbridge/src/cli/clients.rs
// Build model clients, the tool catalog and the orchestrator from config

use askbridge::Orchestrator;
use askbridge::config::Config;
use askbridge::llm::{LlmClient, OpenAiCompatClient};
use askbridge::tools::{
    DatabasePool, DatabaseTool, DialogueTool, TerminalChannel, ToolCatalog, UserChannel,
    WebSearchTool,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Register every tool the configuration allows
pub fn build_catalog(config: &Config, channel: Arc<dyn UserChannel>) -> ToolCatalog {
    let mut catalog = ToolCatalog::new();

    match WebSearchTool::from_settings(&config.search) {
        Some(search) => catalog.register(Arc::new(search)),
        None => info!("Web search disabled (no SERPAPI_KEY)"),
    }

    match DatabasePool::open_read_only(&config.database.path) {
        Ok(pool) => catalog.register(Arc::new(
            DatabaseTool::new(Arc::new(pool), config.database.max_rows)
                .with_timeout(config.limits.tool_timeout),
        )),
        Err(e) => warn!(path = %config.database.path.display(), error = %e, "Database tool disabled"),
    }

    catalog.register(Arc::new(DialogueTool::new(channel)));
    info!(tools = ?catalog.names(), "Tool catalog ready");
    catalog
}

/// Orchestrator over the terminal, with separate planning and execution models
pub fn build_orchestrator(config: &Config) -> Orchestrator {
    let planner: Arc<dyn LlmClient> = Arc::new(OpenAiCompatClient::new(&config.planner));
    let executor: Arc<dyn LlmClient> = Arc::new(OpenAiCompatClient::new(&config.executor));
    info!(
        planner = planner.model_name(),
        executor = executor.model_name(),
        "Models configured"
    );

    let catalog = Arc::new(build_catalog(config, Arc::new(TerminalChannel)));
    Orchestrator::with_models(planner, executor, catalog, config.limits.clone())
}
