//! OpenAI embedding provider.
//!
//! Batched embeddings via the OpenAI embeddings API. The API accepts an
//! input array, so a whole chunk set is embedded in one request and
//! reassembled by the index the API reports.

use crate::embeddings::provider::EmbeddingProvider;
use askdoc_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const EMBEDDING_ENDPOINT: &str = "/v1/embeddings";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// OpenAI embedding provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    /// HTTP client for API requests
    client: Client,

    /// API base URL
    base_url: String,

    /// API key sent as a bearer token
    api_key: String,

    /// Model name (e.g., "text-embedding-3-small")
    model: String,

    /// Expected embedding dimensions
    dimensions: usize,
}

/// Request payload for the OpenAI embeddings API.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

/// Response from the OpenAI embeddings API.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingObject>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingObject {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    /// Create a new OpenAI embedding provider.
    pub fn new(
        model: &str,
        dimensions: usize,
        endpoint: Option<&str>,
        api_key: &str,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::EmbeddingUnavailable(format!(
                    "Failed to create HTTP client for OpenAI: {}",
                    e
                ))
            })?;

        Ok(Self {
            client,
            base_url: endpoint.unwrap_or(DEFAULT_OPENAI_URL).to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            dimensions,
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        // The API rejects empty inputs; blank pages map to the zero
        // vector without leaving a hole in the batch
        let mut payload = Vec::new();
        let mut payload_slots = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            if !text.trim().is_empty() {
                payload.push(text.clone());
                payload_slots.push(i);
            }
        }

        let mut embeddings = vec![vec![0.0; self.dimensions]; texts.len()];
        if payload.is_empty() {
            return Ok(embeddings);
        }

        tracing::debug!("Embedding batch of {} texts via OpenAI", payload.len());

        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingsRequest {
            model: self.model.clone(),
            input: payload,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::EmbeddingUnavailable(format!("Failed to send request to OpenAI: {}", e))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::EmbeddingUnavailable(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let response_body: EmbeddingsResponse = response.json().await.map_err(|e| {
            AppError::EmbeddingUnavailable(format!("Failed to parse OpenAI response: {}", e))
        })?;

        if response_body.data.len() != payload_slots.len() {
            return Err(AppError::EmbeddingUnavailable(format!(
                "OpenAI returned {} embeddings for {} inputs",
                response_body.data.len(),
                payload_slots.len()
            )));
        }

        // Reassemble by the index the API reports, not response order
        for object in response_body.data {
            let slot = payload_slots.get(object.index).ok_or_else(|| {
                AppError::EmbeddingUnavailable(format!(
                    "OpenAI returned out-of-range embedding index {}",
                    object.index
                ))
            })?;

            if object.embedding.len() != self.dimensions {
                return Err(AppError::EmbeddingUnavailable(format!(
                    "Unexpected embedding dimensions: got {}, expected {}",
                    object.embedding.len(),
                    self.dimensions
                )));
            }

            embeddings[*slot] = object.embedding;
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_provider_defaults() {
        let provider =
            OpenAiProvider::new("text-embedding-3-small", 1536, None, "sk-test").unwrap();
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.model_name(), "text-embedding-3-small");
        assert_eq!(provider.dimensions(), 1536);
        assert_eq!(provider.base_url, DEFAULT_OPENAI_URL);
    }

    #[test]
    fn test_openai_provider_custom_endpoint() {
        let provider = OpenAiProvider::new(
            "text-embedding-3-small",
            1536,
            Some("http://gateway.internal"),
            "sk-test",
        )
        .unwrap();
        assert_eq!(provider.base_url, "http://gateway.internal");
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let provider =
            OpenAiProvider::new("text-embedding-3-small", 1536, None, "sk-test").unwrap();
        let embeddings = provider.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[tokio::test]
    async fn test_all_blank_batch_skips_api() {
        let provider =
            OpenAiProvider::new("text-embedding-3-small", 8, None, "sk-test").unwrap();
        let texts = vec!["".to_string(), "   ".to_string()];
        let embeddings = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 2);
        assert!(embeddings.iter().all(|e| e.iter().all(|&x| x == 0.0)));
    }
}
