use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use travel_crew::agent::{Agent, AgentModelConfig};
use travel_crew::config::Settings;
use travel_crew::crew::{Crew, CrewDefinition};
use travel_crew::memory::MemoryConfig;
use travel_crew::task::Task;
use travel_crew::tools::{KnowledgeBaseTool, Tool, ToolRegistry, WebSearchTool};

const RESEARCHER_ROLE: &str = "Travel Destination Researcher";

/// Recommend travel destinations for a set of preferences
#[derive(Debug, Parser)]
#[command(name = "travel-crew", version)]
struct Cli {
    /// Free-text travel preferences
    #[arg(short, long, env = "TRAVEL_PREFERENCES")]
    preferences: String,

    /// Settings file (defaults to ./travel_crew.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// TOML crew definition replacing the built-in researcher crew
    #[arg(short, long)]
    definition: Option<PathBuf>,

    /// Give the agent access to the configured knowledge base
    #[arg(long)]
    knowledge_base: bool,

    /// Enable short-term memory with the configured embedder
    #[arg(long)]
    memory: bool,

    /// Log agent steps
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    let verbose = cli.verbose || settings.verbose;

    let default_level = if verbose { "travel_crew=debug" } else { "travel_crew=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let llm = settings.agent_model().context("failed to set up the model provider")?;
    let registry = tool_registry(&settings, cli.knowledge_base)?;

    let mut crew = match &cli.definition {
        Some(path) => CrewDefinition::from_file(path)
            .with_context(|| format!("failed to read crew definition {}", path.display()))?
            .with_default_region(&settings.region)
            .build(&llm, &registry)
            .context("invalid crew definition")?,
        None => researcher_crew(&settings, llm, &registry, verbose)?,
    };
    crew = raise_verbosity(crew, verbose);

    if cli.memory {
        let memory = settings
            .memory_config()
            .unwrap_or_else(|| MemoryConfig::default().with_region(settings.region.clone()));
        crew = crew.memory(memory);
    }

    let inputs = HashMap::from([("preferences".to_string(), cli.preferences.clone())]);
    let output = crew.kickoff(&inputs).await.context("crew run failed")?;

    tracing::info!(
        tasks = output.tasks_output.len(),
        tokens = output.token_usage.total(),
        "crew finished"
    );
    println!("{}", output);
    Ok(())
}

// A definition's own `verbose = true` survives a quiet command line
fn raise_verbosity(crew: Crew, verbose: bool) -> Crew {
    if verbose {
        crew.verbose(true)
    } else {
        crew
    }
}

fn tool_registry(settings: &Settings, knowledge_base: bool) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WebSearchTool::new().with_endpoint(settings.search.endpoint.clone())));

    if knowledge_base {
        let config = settings
            .knowledge_base_config()
            .context("--knowledge-base needs a [knowledge_base] section in the settings")?;
        let tool = KnowledgeBaseTool::from_env(config).context("failed to set up the knowledge base tool")?;
        registry.register(Arc::new(tool));
    }
    Ok(registry)
}

fn researcher_crew(settings: &Settings, llm: AgentModelConfig, registry: &ToolRegistry, verbose: bool) -> Result<Crew> {
    let tools: Vec<Arc<dyn Tool>> = registry
        .names()
        .into_iter()
        .filter_map(|name| registry.get(name))
        .collect();

    let researcher = Agent::builder(
        RESEARCHER_ROLE,
        "Find dream destinations matching user preferences",
        "You are an experienced travel agent with a passion for discovering hidden gems \
         and popular hotspots around the world. You match every traveller with places \
         that fit their budget, season and interests.",
        llm,
    )
    .tools(tools)
    .allow_delegation(false)
    .max_iter(settings.max_iter)
    .verbose(verbose)
    .build()?;

    let task = Task::new(
        "Based on the user's travel preferences: {preferences}, research and recommend suitable travel destinations.",
        "A list of recommended destinations with brief descriptions.",
        RESEARCHER_ROLE,
    );

    Ok(Crew::new(vec![Arc::new(researcher)], vec![task]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_cli_keeps_definition_verbosity() {
        let crew = raise_verbosity(Crew::new(vec![], vec![]).verbose(true), false);
        assert!(crew.verbose);

        let crew = raise_verbosity(Crew::new(vec![], vec![]), false);
        assert!(!crew.verbose);

        let crew = raise_verbosity(Crew::new(vec![], vec![]), true);
        assert!(crew.verbose);
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from(["travel-crew", "--preferences", "beaches", "--memory", "-v"]).unwrap();
        assert_eq!(cli.preferences, "beaches");
        assert!(cli.memory);
        assert!(cli.verbose);
        assert!(!cli.knowledge_base);
    }
}
