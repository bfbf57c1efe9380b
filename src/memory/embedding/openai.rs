use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EmbeddingError, EmbeddingProviderTrait};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible `/embeddings` endpoint
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [String],
    model: &'a str,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRecord>,
}

#[derive(Deserialize)]
struct EmbeddingRecord {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAIEmbeddingProvider {
    pub fn new(api_key: String, model: String, base_url: Option<String>, dimension: usize) -> Self {
        let base_url = base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string());
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            dimension,
        }
    }
}

#[async_trait]
impl EmbeddingProviderTrait for OpenAIEmbeddingProvider {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                input: texts,
                model: &self.model,
                dimensions: self.dimension,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiError { message });
        }

        let mut records = response.json::<EmbeddingsResponse>().await?.data;
        if records.len() != texts.len() {
            return Err(EmbeddingError::EmptyResponse);
        }
        // Results are not guaranteed to come back in input order
        records.sort_by_key(|r| r.index);
        Ok(records.into_iter().map(|r| r.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
