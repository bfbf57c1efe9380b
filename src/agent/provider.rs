use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::llm::{BedrockProvider, LlmError, LlmProvider};

/// LLM vendors an agent model string can name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    /// Amazon Bedrock Converse API
    Bedrock,
}

impl Provider {
    pub fn prefix(&self) -> &'static str {
        match self {
            Provider::Bedrock => "bedrock",
        }
    }
}

/// Model selection parsed from a `vendor/model-id` string such as
/// `bedrock/anthropic.claude-3-sonnet-20240229-v1:0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model_id: String,
    pub region: String,
    /// Custom base URL (overrides the regional endpoint)
    pub base_url: Option<String>,
}

impl LlmConfig {
    pub fn new(provider: Provider, model_id: String, region: String) -> Self {
        Self {
            provider,
            model_id,
            region,
            base_url: None,
        }
    }

    pub fn parse(model: &str, region: &str) -> Result<Self, LlmError> {
        let (vendor, model_id) = model
            .split_once('/')
            .ok_or_else(|| LlmError::Config(format!("model '{}' must look like 'vendor/model-id'", model)))?;

        let provider = match vendor {
            "bedrock" => Provider::Bedrock,
            other => {
                return Err(LlmError::Config(format!(
                    "unsupported model vendor '{}' in '{}'",
                    other, model
                )))
            }
        };
        if model_id.trim().is_empty() {
            return Err(LlmError::Config(format!("model '{}' has an empty model id", model)));
        }

        Ok(Self::new(provider, model_id.to_string(), region.to_string()))
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Full `vendor/model-id` string
    pub fn model_string(&self) -> String {
        format!("{}/{}", self.provider.prefix(), self.model_id)
    }

    /// Build the provider client, reading credentials from the environment
    pub fn build_provider(&self) -> Result<Arc<dyn LlmProvider>, LlmError> {
        match self.provider {
            Provider::Bedrock => {
                let mut provider = BedrockProvider::from_env(&self.region)?;
                if let Some(base_url) = &self.base_url {
                    provider = provider.with_endpoint(base_url.clone());
                }
                Ok(Arc::new(provider))
            }
        }
    }
}
