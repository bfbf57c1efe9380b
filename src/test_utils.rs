//! Scripted providers and tools shared by unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::llm::{
    ChatMessage, ChatMessageRole, CompletionRequest, CompletionResponse, ContentBlock, LlmError,
    LlmProvider, StopReason, TokenUsage,
};
use crate::tools::{Tool, ToolError};

/// Replays canned responses and records every request
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn completion(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::MalformedResponse("script exhausted".to_string()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn usage() -> TokenUsage {
    TokenUsage {
        input_tokens: 10,
        output_tokens: 5,
    }
}

pub fn text_response(text: &str) -> CompletionResponse {
    CompletionResponse {
        message: ChatMessage::assistant(text),
        stop_reason: StopReason::EndTurn,
        usage: usage(),
    }
}

pub fn tool_use_response(id: &str, name: &str, input: Value) -> CompletionResponse {
    CompletionResponse {
        message: ChatMessage {
            role: ChatMessageRole::Assistant,
            content: vec![ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input,
            }],
        },
        stop_reason: StopReason::ToolUse,
        usage: usage(),
    }
}

pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the input text"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"text": {"type": "string"}}})
    }

    async fn call(&self, input: Value) -> Result<String, ToolError> {
        Ok(format!("echo: {}", crate::tools::string_arg(&input, "text")?))
    }
}

pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "broken"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn call(&self, _input: Value) -> Result<String, ToolError> {
        Err(ToolError::Execution("service unavailable".to_string()))
    }
}
