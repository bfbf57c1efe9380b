//! Amazon Bedrock Converse API provider.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};

use super::aws::{encode_path_segment, AwsCredentials, SigV4Signer};
use super::{
    ChatMessage, ChatMessageRole, CompletionRequest, CompletionResponse, ContentBlock, LlmError,
    LlmProvider, StopReason, TokenUsage,
};

/// Chat completions through `POST /model/{modelId}/converse`
pub struct BedrockProvider {
    client: reqwest::Client,
    signer: SigV4Signer,
    endpoint: String,
}

impl BedrockProvider {
    pub fn new(credentials: AwsCredentials, region: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            signer: SigV4Signer::new(credentials, region, "bedrock"),
            endpoint: format!("https://bedrock-runtime.{}.amazonaws.com", region),
        }
    }

    /// Provider for `region` using credentials from the environment
    pub fn from_env(region: &str) -> Result<Self, LlmError> {
        Ok(Self::new(AwsCredentials::from_env()?, region))
    }

    /// Point the provider at another base URL (VPC endpoints, test servers)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn converse_url(&self, model: &str) -> Result<Url, LlmError> {
        let raw = format!("{}/model/{}/converse", self.endpoint, encode_path_segment(model));
        Url::parse(&raw).map_err(|e| LlmError::Config(format!("invalid endpoint {}: {}", raw, e)))
    }
}

#[async_trait]
impl LlmProvider for BedrockProvider {
    async fn completion(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = self.converse_url(&request.model)?;
        let body = serde_json::to_vec(&converse_body(&request))?;
        tracing::trace!("converse request: {}", String::from_utf8_lossy(&body));

        let signed = self.signer.sign(
            "POST",
            &url,
            &[("content-type", "application/json")],
            &body,
            chrono::Utc::now(),
        );

        let mut builder = self
            .client
            .post(url)
            .header("content-type", "application/json");
        for (name, value) in signed {
            builder = builder.header(name, value);
        }

        let response = builder.body(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::trace!("converse response ({}): {}", status, text);

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let raw: Value = serde_json::from_str(&text)?;
        parse_converse_response(&raw)
    }

    fn name(&self) -> &str {
        "bedrock"
    }
}

/// Build the Converse JSON body for a request
pub fn converse_body(request: &CompletionRequest) -> Value {
    let messages: Vec<Value> = request.messages.iter().map(message_to_json).collect();
    let mut body = json!({ "messages": messages });

    if let Some(system) = &request.system {
        body["system"] = json!([{ "text": system }]);
    }

    let mut inference = serde_json::Map::new();
    if let Some(max_tokens) = request.max_tokens {
        inference.insert("maxTokens".to_string(), json!(max_tokens));
    }
    if let Some(temperature) = request.temperature {
        inference.insert("temperature".to_string(), json!(temperature));
    }
    if !inference.is_empty() {
        body["inferenceConfig"] = Value::Object(inference);
    }

    if !request.tools.is_empty() {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "toolSpec": {
                        "name": tool.name,
                        "description": tool.description,
                        "inputSchema": { "json": tool.input_schema },
                    }
                })
            })
            .collect();
        body["toolConfig"] = json!({ "tools": tools });
    }

    body
}

fn message_to_json(message: &ChatMessage) -> Value {
    let role = match message.role {
        ChatMessageRole::User => "user",
        ChatMessageRole::Assistant => "assistant",
    };
    let content: Vec<Value> = message
        .content
        .iter()
        .map(|block| match block {
            ContentBlock::Text(text) => json!({ "text": text }),
            ContentBlock::ToolUse { id, name, input } => json!({
                "toolUse": { "toolUseId": id, "name": name, "input": input }
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => json!({
                "toolResult": {
                    "toolUseId": tool_use_id,
                    "content": [{ "text": content }],
                    "status": if *is_error { "error" } else { "success" },
                }
            }),
        })
        .collect();

    json!({ "role": role, "content": content })
}

/// Map a Converse response back to provider-neutral types
pub fn parse_converse_response(raw: &Value) -> Result<CompletionResponse, LlmError> {
    let message = raw
        .pointer("/output/message")
        .ok_or_else(|| LlmError::MalformedResponse("missing output.message".to_string()))?;

    let role = match message.get("role").and_then(Value::as_str) {
        Some("user") => ChatMessageRole::User,
        _ => ChatMessageRole::Assistant,
    };

    let mut content = Vec::new();
    for block in message
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| LlmError::MalformedResponse("missing output.message.content".to_string()))?
    {
        if let Some(text) = block.get("text").and_then(Value::as_str) {
            content.push(ContentBlock::Text(text.to_string()));
        } else if let Some(tool_use) = block.get("toolUse") {
            let id = tool_use
                .get("toolUseId")
                .and_then(Value::as_str)
                .ok_or_else(|| LlmError::MalformedResponse("toolUse without toolUseId".to_string()))?;
            let name = tool_use
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| LlmError::MalformedResponse("toolUse without name".to_string()))?;
            content.push(ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input: tool_use.get("input").cloned().unwrap_or(Value::Null),
            });
        }
        // reasoning and image blocks are not used by the agents
    }

    let stop_reason = StopReason::parse(raw.get("stopReason").and_then(Value::as_str).unwrap_or("end_turn"));

    let usage = TokenUsage {
        input_tokens: raw.pointer("/usage/inputTokens").and_then(Value::as_u64).unwrap_or(0) as u32,
        output_tokens: raw.pointer("/usage/outputTokens").and_then(Value::as_u64).unwrap_or(0) as u32,
    };

    Ok(CompletionResponse {
        message: ChatMessage { role, content },
        stop_reason,
        usage,
    })
}
