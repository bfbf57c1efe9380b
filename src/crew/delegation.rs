use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::{Agent, TaskContext};
use crate::task::Task;
use crate::tools::{string_arg, Tool, ToolError};

pub const DELEGATE_WORK_TOOL: &str = "delegate_work";

/// Lets an agent hand a sub-task to a coworker in the same crew.
///
/// Coworkers run with their own tools only, so a delegated run cannot
/// delegate again.
pub struct DelegateWorkTool {
    coworkers: Vec<Arc<Agent>>,
    description: String,
}

impl DelegateWorkTool {
    pub fn new(coworkers: Vec<Arc<Agent>>) -> Self {
        let roles: Vec<&str> = coworkers.iter().map(|a| a.role.as_str()).collect();
        let description = format!(
            "Delegate a specific task to one of the following coworkers: {}. \
             Provide the coworker's role, the task you want them to do, and all the \
             context they need, because they know nothing about your task.",
            roles.join(", ")
        );
        Self { coworkers, description }
    }

    fn find(&self, role: &str) -> Option<&Arc<Agent>> {
        let wanted = role.trim().to_lowercase();
        self.coworkers.iter().find(|a| a.role.to_lowercase() == wanted)
    }
}

#[async_trait]
impl Tool for DelegateWorkTool {
    fn name(&self) -> &str {
        DELEGATE_WORK_TOOL
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        let roles: Vec<&str> = self.coworkers.iter().map(|a| a.role.as_str()).collect();
        json!({
            "type": "object",
            "properties": {
                "coworker": { "type": "string", "enum": roles, "description": "Role of the coworker" },
                "task": { "type": "string", "description": "The task to delegate" },
                "context": { "type": "string", "description": "Everything the coworker needs to know" }
            },
            "required": ["coworker", "task"]
        })
    }

    async fn call(&self, input: Value) -> Result<String, ToolError> {
        let role = string_arg(&input, "coworker")?;
        let request = string_arg(&input, "task")?;
        let context = input
            .get("context")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let coworker = self.find(&role).ok_or_else(|| {
            let roles: Vec<&str> = self.coworkers.iter().map(|a| a.role.as_str()).collect();
            ToolError::InvalidInput(format!(
                "Coworker '{}' not found. Available coworkers: {}",
                role,
                roles.join(", ")
            ))
        })?;

        tracing::debug!(coworker = %coworker.role, "delegating work");
        let task = Task::new(
            request,
            "Your best answer to your coworker asking you this, accounting for the context shared.",
            coworker.role.clone(),
        );
        let response = coworker
            .execute_task(&task, &TaskContext::new().with_previous_outputs(context))
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;
        Ok(response.content)
    }
}
