pub mod knowledge_base;
pub mod search;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::llm::{LlmError, ToolSpec};

pub use knowledge_base::{KnowledgeBaseConfig, KnowledgeBaseTool, NO_DATA_AVAILABLE};
pub use search::WebSearchTool;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },
    #[error("Model call failed: {0}")]
    Llm(#[from] LlmError),
    #[error("{0}")]
    Execution(String),
}

/// A callable an agent can use to act on the outside world
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the object passed to [`Tool::call`]
    fn input_schema(&self) -> serde_json::Value;

    async fn call(&self, input: serde_json::Value) -> Result<String, ToolError>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Schema for tools that take a single required string argument
pub fn single_string_schema(field: &str, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            field: { "type": "string", "description": description }
        },
        "required": [field]
    })
}

/// Pull a required string field out of a tool input object.
///
/// Models sometimes send the bare string instead of an object; that is
/// accepted too.
pub fn string_arg(input: &serde_json::Value, field: &str) -> Result<String, ToolError> {
    match input {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Object(map) => map
            .get(field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ToolError::InvalidInput(format!("missing string field '{}'", field))),
        other => Err(ToolError::InvalidInput(format!(
            "expected an object with '{}', got: {}",
            field, other
        ))),
    }
}

/// Named tools available to crew definitions
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        self.tools.insert(tool.name().to_string(), tool)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}
