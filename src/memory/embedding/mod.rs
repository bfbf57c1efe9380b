mod bedrock;
mod openai;

pub use bedrock::BedrockEmbeddingProvider;
pub use openai::OpenAIEmbeddingProvider;

use async_trait::async_trait;

use super::config::{EmbeddingConfig, EmbeddingProvider};
use crate::llm::AwsCredentials;

/// Embedding provider trait
#[async_trait]
pub trait EmbeddingProviderTrait: Send + Sync {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let results = self.embed_texts(&[text.to_string()]).await?;
        results.into_iter().next().ok_or(EmbeddingError::EmptyResponse)
    }
    fn dimension(&self) -> usize;
}

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("API error: {message}")]
    ApiError { message: String },
    #[error("Empty response from embedding provider")]
    EmptyResponse,
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Factory function to create embedding providers
pub fn create_embedding_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProviderTrait>, EmbeddingError> {
    match config.provider {
        EmbeddingProvider::Bedrock => {
            let credentials = AwsCredentials::from_env()
                .map_err(|e| EmbeddingError::ConfigError(e.to_string()))?;
            Ok(Box::new(BedrockEmbeddingProvider::new(
                credentials,
                &config.region,
                config.model.clone(),
                config.dimension,
            )))
        }
        EmbeddingProvider::OpenAI => {
            if config.api_key.is_empty() {
                return Err(EmbeddingError::ConfigError("OPENAI_API_KEY is not set".to_string()));
            }
            Ok(Box::new(OpenAIEmbeddingProvider::new(
                config.api_key.clone(),
                config.model.clone(),
                Some(config.base_url.clone()),
                config.dimension,
            )))
        }
    }
}
