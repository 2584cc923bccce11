//! Ollama embedding provider.
//!
//! Semantic embeddings via Ollama's local batch embedding endpoint,
//! using models like nomic-embed-text.

use crate::embeddings::provider::EmbeddingProvider;
use askdoc_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBED_ENDPOINT: &str = "/api/embed";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Ollama embedding provider using the local API.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

/// Batch request payload for `/api/embed`.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

/// Batch response payload: one vector per input, in input order.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    /// Create a new Ollama provider.
    ///
    /// The endpoint defaults to `OLLAMA_URL` or `http://localhost:11434`.
    pub fn new(model: &str, dimensions: usize, endpoint: Option<&str>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::EmbeddingUnavailable(format!(
                    "Failed to create HTTP client for Ollama: {}",
                    e
                ))
            })?;

        let base_url = endpoint
            .map(|e| e.to_string())
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Ok(Self {
            client,
            base_url,
            model: model.to_string(),
            dimensions,
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
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

        // Blank pages map to the zero vector without being sent; the
        // endpoint rejects empty inputs
        let mut payload = Vec::new();
        let mut payload_slots = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            if !text.trim().is_empty() {
                payload.push(text.as_str());
                payload_slots.push(i);
            }
        }

        let mut embeddings = vec![vec![0.0; self.dimensions]; texts.len()];
        if payload.is_empty() {
            return Ok(embeddings);
        }

        tracing::debug!("Embedding batch of {} texts via Ollama", payload.len());

        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);
        let request = EmbedRequest {
            model: &self.model,
            input: payload,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::EmbeddingUnavailable(format!("Failed to reach Ollama: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::EmbeddingUnavailable(format!(
                "Ollama API error ({}): {}",
                status, body
            )));
        }

        let body: EmbedResponse = response.json().await.map_err(|e| {
            AppError::EmbeddingUnavailable(format!("Failed to parse Ollama response: {}", e))
        })?;

        if body.embeddings.len() != payload_slots.len() {
            return Err(AppError::EmbeddingUnavailable(format!(
                "Ollama returned {} embeddings for {} inputs",
                body.embeddings.len(),
                payload_slots.len()
            )));
        }

        for (slot, vector) in payload_slots.into_iter().zip(body.embeddings) {
            if vector.len() != self.dimensions {
                return Err(AppError::EmbeddingUnavailable(format!(
                    "Unexpected embedding dimensions: got {}, expected {}",
                    vector.len(),
                    self.dimensions
                )));
            }
            embeddings[slot] = vector;
        }

        Ok(embeddings)
    }
}
