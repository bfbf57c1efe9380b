use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::llm::TokenUsage;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    #[error("No input provided for template placeholder '{{{0}}}'")]
    MissingInput(String),
}

/// A unit of work assigned to one agent of a crew
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    /// Prompt template; `{name}` placeholders are filled from kickoff inputs
    pub description: String,
    /// Guidance for the agent about the shape of the answer. Not validated.
    pub expected_output: String,
    /// Role of the agent that executes this task
    pub agent: String,
}

impl Task {
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.into(),
            expected_output: expected_output.into(),
            agent: agent.into(),
        }
    }

    /// Copy of this task with every placeholder in the description and the
    /// expected output replaced by its input value
    pub fn interpolate(&self, inputs: &HashMap<String, String>) -> Result<Task, TaskError> {
        Ok(Task {
            id: self.id.clone(),
            description: interpolate_template(&self.description, inputs)?,
            expected_output: interpolate_template(&self.expected_output, inputs)?,
            agent: self.agent.clone(),
        })
    }

    /// Placeholder names used by this task, in order of first appearance
    pub fn placeholders(&self) -> Vec<String> {
        let mut names = Vec::new();
        for template in [&self.description, &self.expected_output] {
            for segment in parse_template(template) {
                if let Segment::Placeholder(name) = segment {
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

// `{{` and `}}` are literal braces; a brace pair around anything that is not
// an identifier (e.g. inline JSON) is left untouched.
fn parse_template(template: &str) -> Vec<Segment<'_>> {
    let bytes = template.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                segments.push(Segment::Literal(&template[start..i + 1]));
                i += 2;
                start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                segments.push(Segment::Literal(&template[start..i + 1]));
                i += 2;
                start = i;
            }
            b'{' => {
                let name_len = bytes[i + 1..]
                    .iter()
                    .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                    .count();
                let close = i + 1 + name_len;
                if name_len > 0 && bytes.get(close) == Some(&b'}') {
                    segments.push(Segment::Literal(&template[start..i]));
                    segments.push(Segment::Placeholder(&template[i + 1..close]));
                    i = close + 1;
                    start = i;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    segments.push(Segment::Literal(&template[start..]));
    segments
}

pub fn interpolate_template(template: &str, inputs: &HashMap<String, String>) -> Result<String, TaskError> {
    let mut out = String::with_capacity(template.len());
    for segment in parse_template(template) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(name) => {
                let value = inputs
                    .get(name)
                    .ok_or_else(|| TaskError::MissingInput(name.to_string()))?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

/// Result of running one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task_id: String,
    pub description: String,
    pub expected_output: String,
    pub raw: String,
    pub agent: String,
    pub tools_used: Vec<String>,
    pub usage: TokenUsage,
    pub execution_time_ms: u64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl std::fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
