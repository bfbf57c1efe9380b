use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentError, TaskContext};
use crate::crew::delegation::DelegateWorkTool;
use crate::llm::TokenUsage;
use crate::memory::{MemoryConfig, MemoryError, ShortTermMemory};
use crate::task::{Task, TaskError, TaskOutput};
use crate::tools::Tool;

const OUTPUT_DIVIDER: &str = "\n\n----------\n\n";

#[derive(Debug, thiserror::Error)]
pub enum CrewError {
    #[error("Invalid crew configuration: {0}")]
    Configuration(String),
    #[error("Could not parse crew definition: {0}")]
    Definition(#[from] toml::de::Error),
    #[error("Could not read crew definition: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Result of a crew run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Raw output of the last task
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
    pub token_usage: TokenUsage,
}

impl std::fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Agents and the tasks they run, in order
pub struct Crew {
    pub agents: Vec<Arc<Agent>>,
    pub tasks: Vec<Task>,
    pub verbose: bool,
    memory_config: Option<MemoryConfig>,
    short_term: Option<ShortTermMemory>,
}

impl std::fmt::Debug for Crew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crew")
            .field("agents", &self.agents)
            .field("tasks", &self.tasks)
            .field("verbose", &self.verbose)
            .field("memory", &self.memory_config)
            .finish()
    }
}

impl Crew {
    pub fn new(agents: Vec<Arc<Agent>>, tasks: Vec<Task>) -> Self {
        Self {
            agents,
            tasks,
            verbose: false,
            memory_config: None,
            short_term: None,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable short-term memory; the store is built on first kickoff
    pub fn memory(mut self, config: MemoryConfig) -> Self {
        self.memory_config = Some(config);
        self
    }

    /// Use an already built memory instead of one derived from config
    pub fn with_short_term_memory(mut self, memory: ShortTermMemory) -> Self {
        self.short_term = Some(memory);
        self
    }

    pub fn has_memory(&self) -> bool {
        self.short_term.is_some() || self.memory_config.is_some()
    }

    pub fn agent(&self, role: &str) -> Option<&Arc<Agent>> {
        self.agents.iter().find(|a| a.role == role)
    }

    /// Check the crew can run: agents and tasks present, roles unique,
    /// every task assigned to a crew member
    pub fn validate(&self) -> Result<(), CrewError> {
        if self.agents.is_empty() {
            return Err(CrewError::Configuration("a crew needs at least one agent".to_string()));
        }
        if self.tasks.is_empty() {
            return Err(CrewError::Configuration("a crew needs at least one task".to_string()));
        }

        for (i, agent) in self.agents.iter().enumerate() {
            if self.agents[..i].iter().any(|other| other.role == agent.role) {
                return Err(CrewError::Configuration(format!(
                    "agent role '{}' is used more than once",
                    agent.role
                )));
            }
        }

        for task in &self.tasks {
            if self.agent(&task.agent).is_none() {
                let roles: Vec<&str> = self.agents.iter().map(|a| a.role.as_str()).collect();
                return Err(CrewError::Configuration(format!(
                    "task '{}' is assigned to '{}', which is not in the crew (agents: {})",
                    truncate(&task.description, 60),
                    task.agent,
                    roles.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Run every task in declaration order and return the last output
    pub async fn kickoff(&mut self, inputs: &HashMap<String, String>) -> Result<CrewOutput, CrewError> {
        self.validate()?;

        // Fail on a missing input before any model call
        let tasks = self
            .tasks
            .iter()
            .map(|task| task.interpolate(inputs))
            .collect::<Result<Vec<_>, _>>()?;

        if self.short_term.is_none() {
            if let Some(config) = &self.memory_config {
                self.short_term = Some(ShortTermMemory::from_config(config).await?);
            }
        }

        self.log(&format!("Crew kickoff with {} task(s)", tasks.len()));

        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(tasks.len());
        let mut token_usage = TokenUsage::default();

        for task in &tasks {
            let agent = self
                .agent(&task.agent)
                .cloned()
                .ok_or_else(|| CrewError::Configuration(format!("no agent with role '{}'", task.agent)))?;

            let previous = outputs
                .iter()
                .map(|o| o.raw.as_str())
                .collect::<Vec<_>>()
                .join(OUTPUT_DIVIDER);
            let mut context = TaskContext::new().with_previous_outputs(previous);
            if let Some(memory) = &self.short_term {
                let hits = memory.search(&task.description, None).await?;
                tracing::debug!(task = %task.id, hits = hits.len(), "short-term memory searched");
                context = context.with_memories(hits.into_iter().map(|e| e.content).collect());
            }

            self.log(&format!("Task started by {}: {}", agent.role, task.description));
            let extra_tools = self.delegation_tools(&agent);
            let response = agent.execute_task_with_tools(task, &context, &extra_tools).await?;
            token_usage.add(response.usage);

            let output = TaskOutput {
                task_id: task.id.clone(),
                description: task.description.clone(),
                expected_output: task.expected_output.clone(),
                raw: response.content,
                agent: agent.role.clone(),
                tools_used: response.tools_used,
                usage: response.usage,
                execution_time_ms: response.execution_time_ms,
                completed_at: chrono::Utc::now(),
            };
            self.log(&format!("Task completed by {} in {}ms", agent.role, output.execution_time_ms));

            if let Some(memory) = self.short_term.as_mut() {
                let metadata = HashMap::from([
                    ("agent".to_string(), output.agent.clone()),
                    ("task".to_string(), output.description.clone()),
                ]);
                memory.save(&output.raw, metadata).await?;
            }

            outputs.push(output);
        }

        let raw = outputs.last().map(|o| o.raw.clone()).unwrap_or_default();
        Ok(CrewOutput {
            raw,
            tasks_output: outputs,
            token_usage,
        })
    }

    fn delegation_tools(&self, agent: &Arc<Agent>) -> Vec<Arc<dyn Tool>> {
        if !agent.allow_delegation {
            return Vec::new();
        }
        let coworkers: Vec<Arc<Agent>> = self
            .agents
            .iter()
            .filter(|other| other.role != agent.role)
            .cloned()
            .collect();
        if coworkers.is_empty() {
            return Vec::new();
        }
        let tool: Arc<dyn Tool> = Arc::new(DelegateWorkTool::new(coworkers));
        vec![tool]
    }

    fn log(&self, message: &str) {
        if self.verbose {
            tracing::info!("{}", message);
        } else {
            tracing::debug!("{}", message);
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentModelConfig;
    use crate::crew::DELEGATE_WORK_TOOL;
    use crate::llm::ContentBlock;
    use crate::memory::{storage::InMemoryVectorStorage, EmbeddingError, EmbeddingProviderTrait, MemoryLimits};
    use crate::test_utils::{text_response, tool_use_response, ScriptedProvider};
    use serde_json::json;

    const RESEARCHER: &str = "Travel Destination Researcher";

    fn agent(role: &str, provider: Arc<ScriptedProvider>) -> Arc<Agent> {
        Arc::new(
            Agent::builder(
                role,
                "Find dream destinations matching user preferences",
                "You are an experienced travel agent.",
                AgentModelConfig::new(provider, "test-model".to_string()),
            )
            .build()
            .unwrap(),
        )
    }

    fn research_task() -> Task {
        Task::new(
            "Based on the user's travel preferences: {preferences}, research and recommend suitable travel destinations.",
            "A list of recommended destinations with brief descriptions.",
            RESEARCHER,
        )
    }

    fn inputs() -> HashMap<String, String> {
        HashMap::from([("preferences".to_string(), "warm beaches in March".to_string())])
    }

    fn first_prompt(provider: &ScriptedProvider, request: usize) -> String {
        provider.requests()[request].messages[0].text()
    }

    #[test]
    fn test_validate_well_formed_crew() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let crew = Crew::new(vec![agent(RESEARCHER, provider)], vec![research_task()]);
        assert!(crew.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_task_for_unknown_agent() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let task = Task::new("Plan the trip", "An itinerary", "Itinerary Planner");
        let crew = Crew::new(vec![agent(RESEARCHER, provider)], vec![task]);

        let err = crew.validate().unwrap_err();
        match err {
            CrewError::Configuration(message) => {
                assert!(message.contains("Itinerary Planner"));
                assert!(message.contains(RESEARCHER));
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_empty_and_duplicate_crews() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let no_agents = Crew::new(vec![], vec![research_task()]);
        assert!(matches!(no_agents.validate(), Err(CrewError::Configuration(_))));

        let no_tasks = Crew::new(vec![agent(RESEARCHER, provider.clone())], vec![]);
        assert!(matches!(no_tasks.validate(), Err(CrewError::Configuration(_))));

        let duplicates = Crew::new(
            vec![agent(RESEARCHER, provider.clone()), agent(RESEARCHER, provider)],
            vec![research_task()],
        );
        assert!(matches!(duplicates.validate(), Err(CrewError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_kickoff_single_task_substitutes_preferences() {
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("1. Zanzibar\n2. Goa")]));
        let mut crew = Crew::new(vec![agent(RESEARCHER, provider.clone())], vec![research_task()]);

        let output = crew.kickoff(&inputs()).await.unwrap();

        assert_eq!(output.raw, "1. Zanzibar\n2. Goa");
        assert_eq!(output.tasks_output.len(), 1);
        assert_eq!(output.tasks_output[0].agent, RESEARCHER);
        assert_eq!(output.token_usage.total(), 15);
        assert!(first_prompt(&provider, 0).contains("travel preferences: warm beaches in March, research"));
        assert!(!first_prompt(&provider, 0).contains("{preferences}"));
    }

    #[tokio::test]
    async fn test_kickoff_missing_input_fails_before_model_call() {
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("unused")]));
        let mut crew = Crew::new(vec![agent(RESEARCHER, provider.clone())], vec![research_task()]);

        let err = crew.kickoff(&HashMap::new()).await.unwrap_err();

        assert!(matches!(err, CrewError::Task(TaskError::MissingInput(ref key)) if key == "preferences"));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_kickoff_passes_previous_outputs_as_context() {
        let researcher = Arc::new(ScriptedProvider::new(vec![text_response("Zanzibar and Goa")]));
        let planner = Arc::new(ScriptedProvider::new(vec![text_response("Day 1: Stone Town")]));
        let tasks = vec![
            research_task(),
            Task::new("Write an itinerary for the best destination", "A day-by-day plan", "Itinerary Planner"),
        ];
        let mut crew = Crew::new(
            vec![agent(RESEARCHER, researcher), agent("Itinerary Planner", planner.clone())],
            tasks,
        );

        let output = crew.kickoff(&inputs()).await.unwrap();

        assert_eq!(output.raw, "Day 1: Stone Town");
        assert_eq!(output.tasks_output.len(), 2);
        assert!(first_prompt(&planner, 0).contains("This is the context you're working with:\nZanzibar and Goa"));
    }

    #[tokio::test]
    async fn test_delegation_tool_runs_coworker() {
        let lead_provider = Arc::new(ScriptedProvider::new(vec![
            tool_use_response(
                "d-1",
                DELEGATE_WORK_TOOL,
                json!({"coworker": "Budget Analyst", "task": "Estimate a budget for Goa", "context": "Two travellers"}),
            ),
            text_response("Goa, about 1500 EUR."),
        ]));
        let analyst_provider = Arc::new(ScriptedProvider::new(vec![text_response("Roughly 1500 EUR.")]));

        let lead = Arc::new(
            Agent::builder(
                RESEARCHER,
                "Find dream destinations",
                "Experienced travel agent.",
                AgentModelConfig::new(lead_provider.clone(), "test-model".to_string()),
            )
            .allow_delegation(true)
            .build()
            .unwrap(),
        );
        let mut crew = Crew::new(
            vec![lead, agent("Budget Analyst", analyst_provider.clone())],
            vec![research_task()],
        );

        let output = crew.kickoff(&inputs()).await.unwrap();

        assert_eq!(output.raw, "Goa, about 1500 EUR.");
        assert_eq!(output.tasks_output[0].tools_used, vec![DELEGATE_WORK_TOOL]);
        assert!(first_prompt(&analyst_provider, 0).contains("Estimate a budget for Goa"));
        assert!(analyst_provider.requests()[0].tools.is_empty());

        match &lead_provider.requests()[1].messages[2].content[0] {
            ContentBlock::ToolResult { content, is_error, .. } => {
                assert!(!is_error);
                assert_eq!(content, "Roughly 1500 EUR.");
            }
            other => panic!("unexpected block {:?}", other),
        }
    }

    struct ConstantEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProviderTrait for ConstantEmbedder {
        async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn test_memory_feeds_later_tasks() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            text_response("Zanzibar has great beaches."),
            text_response("Pack sunscreen."),
        ]));
        let memory = ShortTermMemory::new(
            Box::new(ConstantEmbedder),
            Box::new(InMemoryVectorStorage::new()),
            2,
            MemoryLimits::default(),
        );
        let tasks = vec![
            research_task(),
            Task::new("Write a packing list", "A short list", RESEARCHER),
        ];
        let mut crew = Crew::new(vec![agent(RESEARCHER, provider.clone())], tasks).with_short_term_memory(memory);

        crew.kickoff(&inputs()).await.unwrap();

        let second = first_prompt(&provider, 1);
        assert!(second.contains("Relevant notes from earlier work:\n- Zanzibar has great beaches."));
        assert!(!first_prompt(&provider, 0).contains("Relevant notes"));
    }

    #[tokio::test]
    async fn test_memory_outlives_a_single_kickoff() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            text_response("Zanzibar has great beaches."),
            text_response("Try Crete this time."),
        ]));
        let memory = ShortTermMemory::new(
            Box::new(ConstantEmbedder),
            Box::new(InMemoryVectorStorage::new()),
            2,
            MemoryLimits::default(),
        );
        let mut crew = Crew::new(vec![agent(RESEARCHER, provider.clone())], vec![research_task()])
            .with_short_term_memory(memory);

        crew.kickoff(&inputs()).await.unwrap();
        let output = crew.kickoff(&inputs()).await.unwrap();

        assert_eq!(output.raw, "Try Crete this time.");
        assert!(!first_prompt(&provider, 0).contains("Relevant notes"));
        assert!(first_prompt(&provider, 1).contains("- Zanzibar has great beaches.\n\nBegin!"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Zürich trip", 3), "Zür...");
    }
}
