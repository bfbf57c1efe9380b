use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::agent::state::PerformanceMetrics;
use crate::llm::{LlmError, LlmProvider, TokenUsage};
use crate::tools::Tool;

pub const DEFAULT_MAX_ITER: usize = 15;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Core Agent structure
pub struct Agent {
    pub id: String,

    // Persona
    pub role: String,
    pub goal: String,
    pub backstory: String,

    pub tools: Vec<Arc<dyn Tool>>,
    pub allow_delegation: bool,
    /// Upper bound on tool-calling rounds before a final answer is forced
    pub max_iter: usize,
    pub verbose: bool,

    pub llm: AgentModelConfig,

    pub(crate) metrics: Mutex<PerformanceMetrics>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("goal", &self.goal)
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("allow_delegation", &self.allow_delegation)
            .field("max_iter", &self.max_iter)
            .field("model", &self.llm.model_name)
            .finish()
    }
}

/// LLM configuration for agents
#[derive(Clone)]
pub struct AgentModelConfig {
    pub provider: Arc<dyn LlmProvider>,
    /// Model id as the provider expects it (no vendor prefix)
    pub model_name: String,
    pub temperature: Option<f32>,
    pub max_tokens: u32,
}

impl AgentModelConfig {
    pub fn new(provider: Arc<dyn LlmProvider>, model_name: String) -> Self {
        Self {
            provider,
            model_name,
            temperature: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Agent error types
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("Agent '{role}' produced no final answer after {iterations} iterations")]
    NoFinalAnswer { role: String, iterations: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Detailed information about a tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    /// Input passed to the tool (as JSON string)
    pub parameters: String,
    pub result: String,
    pub execution_time_ms: u64,
    pub error: Option<String>,
}

impl ToolCall {
    pub fn new(tool_name: String, parameters: String, result: String, execution_time_ms: u64) -> Self {
        Self {
            tool_name,
            parameters,
            result,
            execution_time_ms,
            error: None,
        }
    }

    pub fn with_error(tool_name: String, parameters: String, error: String, execution_time_ms: u64) -> Self {
        Self {
            tool_name,
            parameters,
            result: String::new(),
            execution_time_ms,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// What one agent run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub content: String,
    pub usage: TokenUsage,
    /// Names of tools used, in call order
    pub tools_used: Vec<String>,
    pub tool_calls: Vec<ToolCall>,
    /// Model round trips, including the final one
    pub iterations: usize,
    pub execution_time_ms: u64,
    pub model_used: String,
}

impl AgentResponse {
    pub fn tool_execution_time_ms(&self) -> u64 {
        self.tool_calls.iter().map(|tc| tc.execution_time_ms).sum()
    }
}
