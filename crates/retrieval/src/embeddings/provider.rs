//! Embedding provider trait and factory.

use askdoc_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// Implementations must be deterministic for identical input within a
/// session and must return one vector per input text, in input order.
/// Provider failures surface as `AppError::EmbeddingUnavailable` and are
/// never retried here.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Provider name (e.g., "ollama", "openai", "mock").
    fn provider_name(&self) -> &str;

    /// Model identifier.
    fn model_name(&self) -> &str;

    /// Dimensionality of every produced vector.
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::EmbeddingUnavailable("No embedding returned".to_string()))
    }
}

/// Create an embedding provider for `provider`.
///
/// `endpoint` overrides the provider's default URL; `api_key` is
/// required by OpenAI, ignored otherwise.
pub fn create_provider(
    provider: &str,
    model: &str,
    dimensions: usize,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let provider =
                super::providers::ollama::OllamaProvider::new(model, dimensions, endpoint)?;
            Ok(Arc::new(provider))
        }
        "openai" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI embedding provider requires an API key".to_string())
            })?;
            let provider = super::providers::openai::OpenAiProvider::new(
                model, dimensions, endpoint, api_key,
            )?;
            Ok(Arc::new(provider))
        }
        "mock" => Ok(Arc::new(super::providers::mock::MockProvider::new(
            dimensions,
        ))),
        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: ollama, openai, mock",
            other
        ))),
    }
}
