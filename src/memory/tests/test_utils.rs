use super::super::*;
use async_trait::async_trait;

/// Vocabulary the keyword embedder scores against, one axis per word
pub const VOCABULARY: [&str; 4] = ["beach", "ski", "museum", "food"];

/// Deterministic embedder: counts vocabulary words in the text
pub struct KeywordEmbedder {
    pub dimension: usize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            dimension: VOCABULARY.len(),
        }
    }
}

#[async_trait]
impl EmbeddingProviderTrait for KeywordEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut vector: Vec<f32> = VOCABULARY
                    .iter()
                    .map(|word| lower.matches(word).count() as f32)
                    .collect();
                vector.resize(self.dimension, 0.0);
                vector
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

pub fn entry(id: &str, content: &str, embedding: Vec<f32>) -> MemoryEntry {
    MemoryEntry {
        id: id.to_string(),
        content: content.to_string(),
        metadata: std::collections::HashMap::from([("agent".to_string(), "tester".to_string())]),
        timestamp: chrono::Utc::now(),
        score: None,
        embedding: Some(embedding),
    }
}
