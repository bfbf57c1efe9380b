use std::sync::Arc;
use std::time::Instant;

use crate::agent::agent::{Agent, AgentError, AgentResponse, ToolCall};
use crate::agent::agent_prompts::{TaskContext, FORCE_FINAL_ANSWER};
use crate::llm::{ChatMessage, ChatMessageRole, CompletionRequest, ContentBlock, TokenUsage};
use crate::task::Task;
use crate::tools::Tool;

const EMPTY_TOOL_OUTPUT: &str = "(no output)";

impl Agent {
    /// Execute a task with the agent's own tools
    pub async fn execute_task(&self, task: &Task, context: &TaskContext) -> Result<AgentResponse, AgentError> {
        self.execute_task_with_tools(task, context, &[]).await
    }

    /// Execute a task; `extra_tools` are added for this run only (delegation)
    pub async fn execute_task_with_tools(
        &self,
        task: &Task,
        context: &TaskContext,
        extra_tools: &[Arc<dyn Tool>],
    ) -> Result<AgentResponse, AgentError> {
        let start_time = Instant::now();
        let result = self.run_loop(task, context, extra_tools).await;
        let elapsed = start_time.elapsed().as_millis() as u64;

        let mut metrics = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
        match result {
            Ok(mut response) => {
                response.execution_time_ms = elapsed;
                metrics.record_task_completion(true, elapsed as f64, response.usage.total());
                for call in &response.tool_calls {
                    metrics.record_tool_usage(&call.tool_name, call.is_success(), call.execution_time_ms as f64);
                }
                Ok(response)
            }
            Err(e) => {
                metrics.record_task_completion(false, elapsed as f64, 0);
                Err(e)
            }
        }
    }

    /// Core reasoning loop: ask the model, run requested tools, repeat
    async fn run_loop(
        &self,
        task: &Task,
        context: &TaskContext,
        extra_tools: &[Arc<dyn Tool>],
    ) -> Result<AgentResponse, AgentError> {
        let tools: Vec<Arc<dyn Tool>> = self.tools.iter().chain(extra_tools.iter()).cloned().collect();
        let specs: Vec<_> = tools.iter().map(|t| t.spec()).collect();
        let system = self.build_system_prompt(&tools);

        let mut messages = vec![ChatMessage::user(self.build_task_prompt(task, context))];
        let mut usage = TokenUsage::default();
        let mut tools_used = Vec::new();
        let mut tool_calls = Vec::new();
        let mut rounds = 0;

        self.log_step(&format!("Working on task: {}", task.description));

        loop {
            let force_final = rounds >= self.max_iter;
            if force_final {
                push_user_text(&mut messages, FORCE_FINAL_ANSWER);
            }

            let mut request = CompletionRequest::new(self.llm.model_name.clone(), messages.clone())
                .with_system(system.clone())
                .with_max_tokens(self.llm.max_tokens)
                .with_tools(specs.clone());
            if let Some(temperature) = self.llm.temperature {
                request = request.with_temperature(temperature);
            }

            let response = self.llm.provider.completion(request).await?;
            usage.add(response.usage);

            let requested: Vec<(String, String, serde_json::Value)> = response
                .message
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                .collect();

            if requested.is_empty() || force_final {
                let content = response.message.text().trim().to_string();
                if content.is_empty() {
                    return Err(AgentError::NoFinalAnswer {
                        role: self.role.clone(),
                        iterations: rounds + 1,
                    });
                }
                self.log_step(&format!("Final answer: {}", content));
                return Ok(AgentResponse {
                    content,
                    usage,
                    tools_used,
                    tool_calls,
                    iterations: rounds + 1,
                    execution_time_ms: 0,
                    model_used: self.llm.model_name.clone(),
                });
            }

            messages.push(response.message);

            let mut results = Vec::with_capacity(requested.len());
            for (id, name, input) in requested {
                let call = self.run_tool(&tools, &name, &input).await;
                tools_used.push(name);
                results.push(ContentBlock::ToolResult {
                    tool_use_id: id,
                    content: tool_result_text(&call),
                    is_error: !call.is_success(),
                });
                tool_calls.push(call);
            }
            messages.push(ChatMessage {
                role: ChatMessageRole::User,
                content: results,
            });

            rounds += 1;
        }
    }

    // Failures are reported back to the model instead of aborting the run
    async fn run_tool(&self, tools: &[Arc<dyn Tool>], name: &str, input: &serde_json::Value) -> ToolCall {
        let parameters = input.to_string();
        let Some(tool) = tools.iter().find(|t| t.name() == name) else {
            let available: Vec<&str> = tools.iter().map(|t| t.name()).collect();
            tracing::warn!(agent = %self.role, tool = name, "model requested an unknown tool");
            return ToolCall::with_error(
                name.to_string(),
                parameters,
                format!(
                    "Tool '{}' does not exist. Available tools: {}",
                    name,
                    if available.is_empty() { "none".to_string() } else { available.join(", ") }
                ),
                0,
            );
        };

        self.log_step(&format!("Using tool {} with input {}", name, parameters));
        let tool_start = Instant::now();
        let outcome = tool.call(input.clone()).await;
        let elapsed = tool_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                self.log_step(&format!("Tool {} returned {} bytes", name, result.len()));
                ToolCall::new(name.to_string(), parameters, result, elapsed)
            }
            Err(e) => {
                tracing::warn!(agent = %self.role, tool = name, error = %e, "tool execution failed");
                ToolCall::with_error(name.to_string(), parameters, format!("Tool error: {}", e), elapsed)
            }
        }
    }

    fn log_step(&self, message: &str) {
        if self.verbose {
            tracing::info!(agent = %self.role, "{}", message);
        } else {
            tracing::debug!(agent = %self.role, "{}", message);
        }
    }
}

// Converse rejects blank text blocks
fn tool_result_text(call: &ToolCall) -> String {
    let text = call.error.as_deref().unwrap_or(&call.result);
    if text.trim().is_empty() {
        EMPTY_TOOL_OUTPUT.to_string()
    } else {
        text.to_string()
    }
}

// Converse wants alternating roles, so extra instructions join the last user turn
fn push_user_text(messages: &mut Vec<ChatMessage>, text: &str) {
    match messages.last_mut() {
        Some(last) if last.role == ChatMessageRole::User => {
            last.content.push(ContentBlock::Text(text.to_string()));
        }
        _ => messages.push(ChatMessage::user(text)),
    }
}
