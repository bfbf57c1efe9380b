pub mod config;
pub mod embedding;
pub mod storage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use config::{EmbeddingProvider, MemoryConfig, MemoryLimits, StorageBackend};
pub use embedding::{create_embedding_provider, EmbeddingError, EmbeddingProviderTrait};
pub use storage::{create_vector_storage, StorageError, VectorStorage};

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Invalid memory configuration: {0}")]
    Config(String),
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("Embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Memory entry structure with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub content: String,
    pub metadata: HashMap<String, String>,
    pub timestamp: DateTime<Utc>,
    /// Similarity to the last search query
    pub score: Option<f32>,
    pub embedding: Option<Vec<f32>>,
}

/// Short-term memory shared by the agents of one crew run
pub struct ShortTermMemory {
    embedder: Box<dyn EmbeddingProviderTrait>,
    storage: Box<dyn VectorStorage>,
    dimension: usize,
    limits: MemoryLimits,
}

impl ShortTermMemory {
    pub fn new(
        embedder: Box<dyn EmbeddingProviderTrait>,
        storage: Box<dyn VectorStorage>,
        dimension: usize,
        limits: MemoryLimits,
    ) -> Self {
        Self {
            embedder,
            storage,
            dimension,
            limits,
        }
    }

    pub async fn from_config(config: &MemoryConfig) -> Result<Self, MemoryError> {
        config.validate()?;
        let embedder = create_embedding_provider(&config.embedding_config()?)?;
        let storage = create_vector_storage(&config.storage).await?;
        tracing::debug!(provider = %config.provider, model = %config.model, "short-term memory ready");
        Ok(Self::new(embedder, storage, config.dimension, config.limits.clone()))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let embedding = self.embedder.embed_text(text).await?;
        if embedding.len() != self.dimension {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }

    /// Embed and store a piece of text, returning the new entry id
    pub async fn save(&mut self, content: &str, metadata: HashMap<String, String>) -> Result<String, MemoryError> {
        let embedding = self.embed(content).await?;
        let entry = MemoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.to_string(),
            metadata,
            timestamp: Utc::now(),
            score: None,
            embedding: Some(embedding),
        };
        self.storage.store(&entry).await?;
        Ok(entry.id)
    }

    /// Most similar stored entries; `limit` defaults to the configured maximum
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<MemoryEntry>, MemoryError> {
        if self.storage.count().await? == 0 {
            return Ok(Vec::new());
        }
        let query_vector = self.embed(query).await?;
        let entries = self
            .storage
            .search(
                &query_vector,
                limit.unwrap_or(self.limits.max_retrieval_results),
                self.limits.similarity_threshold,
            )
            .await?;
        Ok(entries)
    }

    pub async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.storage.count().await?)
    }

    pub async fn reset(&mut self) -> Result<(), MemoryError> {
        Ok(self.storage.clear().await?)
    }
}

#[cfg(test)]
mod tests;
