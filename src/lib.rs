pub mod agent;
pub mod config;
pub mod crew;
pub mod llm;
pub mod memory;
pub mod task;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_utils;

pub use agent::{Agent, AgentError, AgentModelConfig, AgentResponse, LlmConfig, TaskContext};
pub use config::Settings;
pub use crew::{Crew, CrewDefinition, CrewError, CrewOutput};
pub use llm::{LlmError, LlmProvider};
pub use memory::{MemoryConfig, MemoryError, ShortTermMemory};
pub use task::{Task, TaskError, TaskOutput};
pub use tools::{KnowledgeBaseConfig, KnowledgeBaseTool, Tool, ToolError, ToolRegistry, WebSearchTool};
