pub mod agent;
pub mod agent_constructors;
pub mod agent_execution;
pub mod agent_management;
pub mod agent_prompts;
pub mod provider;
pub mod state;

// Re-export main types for easier access
pub use agent::{Agent, AgentError, AgentModelConfig, AgentResponse, ToolCall};
pub use agent_constructors::AgentBuilder;
pub use agent_prompts::TaskContext;
pub use provider::{LlmConfig, Provider};
pub use state::PerformanceMetrics;
