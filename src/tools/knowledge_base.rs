use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{single_string_schema, string_arg, Tool, ToolError};
use crate::llm::{AwsCredentials, LlmError, SigV4Signer};

/// Returned when the retrieval response has no generated text or citations
pub const NO_DATA_AVAILABLE: &str = "No data available";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    pub knowledge_base_id: String,
    /// Foundation model used to generate the answer from retrieved passages
    pub model_id: String,
    /// Empty means the crew's region
    #[serde(default)]
    pub region: String,
    #[serde(default = "default_query_decomposition")]
    pub query_decomposition: bool,
}

fn default_query_decomposition() -> bool {
    true
}

impl KnowledgeBaseConfig {
    pub fn new(knowledge_base_id: String, model_id: String, region: String) -> Self {
        Self {
            knowledge_base_id,
            model_id,
            region,
            query_decomposition: true,
        }
    }

    pub fn model_arn(&self) -> String {
        format!("arn:aws:bedrock:{}::foundation-model/{}", self.region, self.model_id)
    }

    /// Body of a `retrieveAndGenerate` call
    pub fn request_body(&self, question: &str) -> Value {
        let mut kb_config = json!({
            "knowledgeBaseId": self.knowledge_base_id,
            "modelArn": self.model_arn(),
        });
        if self.query_decomposition {
            kb_config["orchestrationConfiguration"] = json!({
                "queryTransformationConfiguration": { "type": "QUERY_DECOMPOSITION" }
            });
        }

        json!({
            "input": { "text": question },
            "retrieveAndGenerateConfiguration": {
                "type": "KNOWLEDGE_BASE",
                "knowledgeBaseConfiguration": kb_config,
            }
        })
    }
}

/// Travel knowledge-base lookup through Bedrock retrieve-and-generate
pub struct KnowledgeBaseTool {
    client: reqwest::Client,
    signer: SigV4Signer,
    config: KnowledgeBaseConfig,
    endpoint: String,
}

impl KnowledgeBaseTool {
    pub fn new(config: KnowledgeBaseConfig, credentials: AwsCredentials) -> Self {
        let endpoint = format!("https://bedrock-agent-runtime.{}.amazonaws.com", config.region);
        Self {
            client: reqwest::Client::new(),
            signer: SigV4Signer::new(credentials, config.region.clone(), "bedrock"),
            config,
            endpoint,
        }
    }

    pub fn from_env(config: KnowledgeBaseConfig) -> Result<Self, LlmError> {
        Ok(Self::new(config, AwsCredentials::from_env()?))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn config(&self) -> &KnowledgeBaseConfig {
        &self.config
    }

    pub async fn query(&self, question: &str) -> Result<String, ToolError> {
        let raw = format!("{}/retrieveAndGenerate", self.endpoint);
        let url = Url::parse(&raw)
            .map_err(|e| ToolError::Execution(format!("invalid endpoint {}: {}", raw, e)))?;
        let body = serde_json::to_vec(&self.config.request_body(question))?;

        let signed = self.signer.sign(
            "POST",
            &url,
            &[("content-type", "application/json")],
            &body,
            chrono::Utc::now(),
        );

        tracing::debug!(knowledge_base = %self.config.knowledge_base_id, "retrieve and generate");
        let mut builder = self.client.post(url).header("content-type", "application/json");
        for (name, value) in signed {
            builder = builder.header(name, value);
        }

        let response = builder.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Service {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let raw: Value = response.json().await?;
        Ok(format_retrieve_response(&raw))
    }
}

/// Render a retrieve-and-generate response for the agent.
///
/// A response without `output.text` or `citations` maps to
/// [`NO_DATA_AVAILABLE`].
pub fn format_retrieve_response(raw: &Value) -> String {
    let text = raw.pointer("/output/text").and_then(Value::as_str);
    let citations = raw.get("citations").and_then(Value::as_array);

    let (Some(text), Some(citations)) = (text, citations) else {
        tracing::warn!("knowledge base response is missing output.text or citations");
        return NO_DATA_AVAILABLE.to_string();
    };

    let mut lines = Vec::new();
    for reference in citations
        .iter()
        .filter_map(|c| c.get("retrievedReferences").and_then(Value::as_array))
        .flatten()
    {
        let snippet = reference
            .pointer("/content/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim();
        let source = reference_uri(reference).unwrap_or("unknown source");
        lines.push(format!("[{}] {} ({})", lines.len() + 1, snippet, source));
    }

    let rendered = if lines.is_empty() {
        "none".to_string()
    } else {
        lines.join("\n")
    };
    format!("Results: {}\nCitations: {}", text, rendered)
}

fn reference_uri(reference: &Value) -> Option<&str> {
    let location = reference.get("location")?;
    ["/s3Location/uri", "/webLocation/url", "/confluenceLocation/url", "/sharePointLocation/url"]
        .iter()
        .find_map(|pointer| location.pointer(pointer).and_then(Value::as_str))
}

#[async_trait]
impl Tool for KnowledgeBaseTool {
    fn name(&self) -> &str {
        "travel_knowledge_base"
    }

    fn description(&self) -> &str {
        "Look up curated travel guides in the travel knowledge base. Returns an answer with citations."
    }

    fn input_schema(&self) -> Value {
        single_string_schema("question", "A natural-language question about travel destinations")
    }

    async fn call(&self, input: Value) -> Result<String, ToolError> {
        let question = string_arg(&input, "question")?;
        self.query(&question).await
    }
}
