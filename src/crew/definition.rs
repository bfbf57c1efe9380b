use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentModelConfig};
use crate::crew::crew::{Crew, CrewError};
use crate::memory::MemoryConfig;
use crate::task::Task;
use crate::tools::{Tool, ToolRegistry};

/// Crew described in TOML:
///
/// ```toml
/// [[agents]]
/// role = "Travel Destination Researcher"
/// goal = "Find dream destinations matching user preferences"
/// backstory = "You are an experienced travel agent."
/// tools = ["web_search"]
///
/// [[tasks]]
/// description = "Recommend destinations for: {preferences}"
/// expected_output = "A list of destinations"
/// agent = "Travel Destination Researcher"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewDefinition {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub memory: Option<MemoryConfig>,
    #[serde(default)]
    pub agents: Vec<AgentDefinition>,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub role: String,
    pub goal: String,
    #[serde(default)]
    pub backstory: String,
    /// Names looked up in the tool registry
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub allow_delegation: bool,
    #[serde(default)]
    pub max_iter: Option<usize>,
    #[serde(default)]
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub description: String,
    #[serde(default)]
    pub expected_output: String,
    pub agent: String,
}

impl CrewDefinition {
    pub fn from_toml_str(source: &str) -> Result<Self, CrewError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CrewError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    /// Region for a `[memory]` section that does not name one
    pub fn with_default_region(mut self, region: &str) -> Self {
        if let Some(memory) = self.memory.as_mut() {
            if memory.region.is_none() {
                memory.region = Some(region.to_string());
            }
        }
        self
    }

    /// Build agents and tasks; every agent shares `llm`
    pub fn build(&self, llm: &AgentModelConfig, registry: &ToolRegistry) -> Result<Crew, CrewError> {
        let mut agents = Vec::with_capacity(self.agents.len());
        for definition in &self.agents {
            let tools = definition
                .tools
                .iter()
                .map(|name| {
                    registry.get(name).ok_or_else(|| {
                        CrewError::Configuration(format!(
                            "agent '{}' uses unknown tool '{}' (available: {})",
                            definition.role,
                            name,
                            registry.names().join(", ")
                        ))
                    })
                })
                .collect::<Result<Vec<Arc<dyn Tool>>, _>>()?;

            let mut builder = Agent::builder(
                definition.role.clone(),
                definition.goal.clone(),
                definition.backstory.clone(),
                llm.clone(),
            )
            .tools(tools)
            .allow_delegation(definition.allow_delegation)
            .verbose(definition.verbose.unwrap_or(self.verbose));
            if let Some(max_iter) = definition.max_iter {
                builder = builder.max_iter(max_iter);
            }
            agents.push(Arc::new(builder.build()?));
        }

        let tasks = self
            .tasks
            .iter()
            .map(|t| Task::new(t.description.clone(), t.expected_output.clone(), t.agent.clone()))
            .collect();

        let mut crew = Crew::new(agents, tasks).verbose(self.verbose);
        if let Some(memory) = &self.memory {
            crew = crew.memory(memory.clone());
        }
        crew.validate()?;
        Ok(crew)
    }
}
