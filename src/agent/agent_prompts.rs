use std::sync::Arc;

use crate::agent::agent::Agent;
use crate::task::Task;
use crate::tools::Tool;

/// Appended once the iteration budget is spent
pub const FORCE_FINAL_ANSWER: &str = "You have used the maximum number of tool calls. \
Do not call any more tools. Give your best complete final answer now, based on what you already know.";

/// Extra material that goes into a task prompt
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    /// Raw outputs of earlier tasks in the crew
    pub previous_outputs: Option<String>,
    /// Hits from short-term memory
    pub memories: Vec<String>,
}

impl TaskContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_previous_outputs(mut self, outputs: String) -> Self {
        if !outputs.trim().is_empty() {
            self.previous_outputs = Some(outputs);
        }
        self
    }

    pub fn with_memories(mut self, memories: Vec<String>) -> Self {
        self.memories = memories;
        self
    }
}

impl Agent {
    /// Build system prompt for the agent
    pub fn build_system_prompt(&self, tools: &[Arc<dyn Tool>]) -> String {
        let mut prompt = format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role,
            self.backstory.trim(),
            self.goal
        );

        if tools.is_empty() {
            prompt.push_str("\n\nYou have no tools. Answer from your own knowledge.");
        } else {
            prompt.push_str("\n\nYou can use the following tools when they help you:\n");
            for tool in tools {
                prompt.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
            }
            prompt.push_str("Call a tool only when you need information you do not have.");
        }

        prompt.push_str(
            "\n\nWhen you are done, reply with your complete final answer as plain text, \
             without mentioning the tools you used.",
        );
        prompt
    }

    /// Build task-specific prompt
    pub fn build_task_prompt(&self, task: &Task, context: &TaskContext) -> String {
        let mut prompt = format!("Current Task: {}", task.description);

        if !task.expected_output.trim().is_empty() {
            prompt.push_str(&format!(
                "\n\nThis is the expected criteria for your final answer: {}\n\
                 You MUST return the actual complete content as the final answer, not a summary.",
                task.expected_output
            ));
        }

        if let Some(previous) = &context.previous_outputs {
            prompt.push_str(&format!(
                "\n\nThis is the context you're working with:\n{}",
                previous
            ));
        }

        if !context.memories.is_empty() {
            let notes: Vec<String> = context
                .memories
                .iter()
                .map(|memory| format!("- {}", memory.trim()))
                .collect();
            prompt.push_str(&format!("\n\nRelevant notes from earlier work:\n{}", notes.join("\n")));
        }

        prompt.push_str("\n\nBegin! Use the tools available when useful and give your best final answer.");
        prompt
    }
}
