use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::MemoryError;

/// Short-term memory configuration: which embedder to call and where to keep vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Embedding provider name (`bedrock`, `aws_bedrock` or `openai`)
    pub provider: String,
    /// Embedding model identifier, e.g. `amazon.titan-embed-text-v2:0`
    pub model: String,
    /// Expected length of every embedding vector
    pub dimension: usize,
    /// Region for Bedrock embeddings; falls back to the crew's region
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
    #[serde(default)]
    pub limits: MemoryLimits,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            provider: "bedrock".to_string(),
            model: "amazon.titan-embed-text-v2:0".to_string(),
            dimension: 1024,
            region: None,
            storage: StorageBackend::InMemory,
            limits: MemoryLimits::default(),
        }
    }
}

/// Embedding services the memory can call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingProvider {
    /// Titan embeddings through Bedrock InvokeModel (AWS_* env vars)
    Bedrock,
    /// OpenAI embeddings (uses OPENAI_API_KEY and optional OPENAI_BASE_URL env vars)
    OpenAI,
}

/// Where embedded entries are kept
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageBackend {
    /// Lives as long as the crew; later kickoffs see earlier outputs
    #[default]
    InMemory,
    /// SQLite file; survives across runs
    Sqlite { path: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryLimits {
    pub max_retrieval_results: usize,
    pub similarity_threshold: f32,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self {
            max_retrieval_results: 3,
            similarity_threshold: 0.35,
        }
    }
}

impl MemoryConfig {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            dimension,
            ..Default::default()
        }
    }

    pub fn with_storage(mut self, storage: StorageBackend) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_region(mut self, region: String) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_limits(mut self, limits: MemoryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn embedding_provider(&self) -> Result<EmbeddingProvider, MemoryError> {
        match self.provider.to_ascii_lowercase().as_str() {
            "bedrock" | "aws_bedrock" => Ok(EmbeddingProvider::Bedrock),
            "openai" => Ok(EmbeddingProvider::OpenAI),
            other => Err(MemoryError::Config(format!("unknown embedding provider '{}'", other))),
        }
    }

    pub fn validate(&self) -> Result<(), MemoryError> {
        self.embedding_provider()?;
        if self.model.trim().is_empty() {
            return Err(MemoryError::Config("embedding model must not be empty".to_string()));
        }
        if self.dimension == 0 {
            return Err(MemoryError::Config("vector dimension must be positive".to_string()));
        }
        Ok(())
    }

    /// Resolve connection details for the embedder
    pub fn embedding_config(&self) -> Result<EmbeddingConfig, MemoryError> {
        let config = match self.embedding_provider()? {
            EmbeddingProvider::Bedrock => EmbeddingConfig {
                provider: EmbeddingProvider::Bedrock,
                api_key: String::new(),
                base_url: String::new(),
                model: self.model.clone(),
                dimension: self.dimension,
                region: self
                    .region
                    .clone()
                    .or_else(|| std::env::var("AWS_REGION").ok())
                    .unwrap_or_else(|| "us-east-1".to_string()),
                headers: HashMap::new(),
            },
            EmbeddingProvider::OpenAI => EmbeddingConfig {
                provider: EmbeddingProvider::OpenAI,
                api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
                base_url: std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                model: self.model.clone(),
                dimension: self.dimension,
                region: String::new(),
                headers: HashMap::new(),
            },
        };
        Ok(config)
    }
}

/// Internal embedding configuration
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    pub region: String,
    pub headers: HashMap<String, String>,
}
