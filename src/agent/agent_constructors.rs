use std::sync::{Arc, Mutex};

use crate::agent::agent::{Agent, AgentError, AgentModelConfig, DEFAULT_MAX_ITER};
use crate::agent::state::PerformanceMetrics;
use crate::tools::Tool;

impl Agent {
    /// Start building an agent from its persona and model
    pub fn builder(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        llm: AgentModelConfig,
    ) -> AgentBuilder {
        AgentBuilder {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            llm,
            tools: Vec::new(),
            allow_delegation: false,
            max_iter: DEFAULT_MAX_ITER,
            verbose: false,
        }
    }
}

pub struct AgentBuilder {
    role: String,
    goal: String,
    backstory: String,
    llm: AgentModelConfig,
    tools: Vec<Arc<dyn Tool>>,
    allow_delegation: bool,
    max_iter: usize,
    verbose: bool,
}

impl AgentBuilder {
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.llm = self.llm.with_temperature(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.llm = self.llm.with_max_tokens(max_tokens);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Result<Agent, AgentError> {
        if self.role.trim().is_empty() {
            return Err(AgentError::InvalidConfiguration("agent role must not be empty".to_string()));
        }
        if self.goal.trim().is_empty() {
            return Err(AgentError::InvalidConfiguration(format!(
                "agent '{}' has an empty goal",
                self.role
            )));
        }

        let mut names: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(AgentError::InvalidConfiguration(format!(
                "agent '{}' lists tool '{}' twice",
                self.role, pair[0]
            )));
        }

        Ok(Agent {
            id: uuid::Uuid::new_v4().to_string(),
            role: self.role,
            goal: self.goal,
            backstory: self.backstory,
            tools: self.tools,
            allow_delegation: self.allow_delegation,
            max_iter: self.max_iter,
            verbose: self.verbose,
            llm: self.llm,
            metrics: Mutex::new(PerformanceMetrics::new()),
        })
    }
}
