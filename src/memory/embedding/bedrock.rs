use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use super::{EmbeddingError, EmbeddingProviderTrait};
use crate::llm::aws::encode_path_segment;
use crate::llm::{AwsCredentials, SigV4Signer};

/// Amazon Titan text embeddings through Bedrock InvokeModel.
///
/// Titan embeds one text per call, so batches become sequential requests.
pub struct BedrockEmbeddingProvider {
    client: reqwest::Client,
    signer: SigV4Signer,
    endpoint: String,
    model: String,
    dimension: usize,
}

#[derive(Deserialize)]
struct TitanResponse {
    embedding: Vec<f32>,
}

impl BedrockEmbeddingProvider {
    pub fn new(credentials: AwsCredentials, region: &str, model: String, dimension: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            signer: SigV4Signer::new(credentials, region, "bedrock"),
            endpoint: format!("https://bedrock-runtime.{}.amazonaws.com", region),
            model,
            dimension,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    // Titan v2 takes the output size as a parameter; v1 is fixed at 1536
    fn request_body(&self, text: &str) -> serde_json::Value {
        if self.model.contains("titan-embed-text-v1") {
            json!({ "inputText": text })
        } else {
            json!({ "inputText": text, "dimensions": self.dimension, "normalize": true })
        }
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let raw = format!("{}/model/{}/invoke", self.endpoint, encode_path_segment(&self.model));
        let url = Url::parse(&raw)
            .map_err(|e| EmbeddingError::ConfigError(format!("invalid endpoint {}: {}", raw, e)))?;
        let body = serde_json::to_vec(&self.request_body(text))?;

        let signed = self.signer.sign(
            "POST",
            &url,
            &[("accept", "application/json"), ("content-type", "application/json")],
            &body,
            chrono::Utc::now(),
        );

        let mut request = self
            .client
            .post(url)
            .header("accept", "application/json")
            .header("content-type", "application/json");
        for (name, value) in signed {
            request = request.header(name, value);
        }

        let response = request.body(body).send().await?;
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiError { message: error_text });
        }

        let parsed: TitanResponse = response.json().await?;
        if parsed.embedding.is_empty() {
            return Err(EmbeddingError::EmptyResponse);
        }
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl EmbeddingProviderTrait for BedrockEmbeddingProvider {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_one(text).await?);
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(model: &str) -> BedrockEmbeddingProvider {
        let credentials = AwsCredentials::new("AKID".to_string(), "SECRET".to_string(), None);
        BedrockEmbeddingProvider::new(credentials, "us-east-1", model.to_string(), 512)
    }

    #[test]
    fn test_v2_requests_dimension() {
        let body = provider("amazon.titan-embed-text-v2:0").request_body("Paris");
        assert_eq!(body["inputText"], "Paris");
        assert_eq!(body["dimensions"], 512);
        assert_eq!(body["normalize"], true);
    }

    #[test]
    fn test_v1_sends_text_only() {
        let body = provider("amazon.titan-embed-text-v1").request_body("Paris");
        assert_eq!(body, json!({ "inputText": "Paris" }));
    }
}
