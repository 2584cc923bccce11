//! Generative client factory.
//!
//! Turns the provider name the configuration layer resolved into a live
//! client, wiring in the endpoint override and API key.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use askdoc_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a generative client for `provider`.
///
/// `endpoint` overrides the provider's default URL; `api_key` is
/// required by OpenAI and ignored by Ollama.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let client = match endpoint {
                Some(endpoint) => OllamaClient::with_base_url(endpoint),
                None => OllamaClient::new(),
            };
            Ok(Arc::new(client))
        }
        "openai" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires an API key".to_string())
            })?;
            let client = match endpoint {
                Some(endpoint) => OpenAiClient::with_base_url(api_key, endpoint),
                None => OpenAiClient::new(api_key),
            };
            Ok(Arc::new(client))
        }
        other => Err(AppError::Config(format!("Unknown provider: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_needs_nothing() {
        let client = create_client("ollama", None, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_endpoint_override_is_accepted() {
        assert!(create_client("ollama", Some("http://gateway:8080"), None).is_ok());
        assert!(create_client("openai", Some("http://gateway:8080"), Some("sk-test")).is_ok());
    }

    #[test]
    fn test_openai_needs_a_key() {
        let client = create_client("openai", None, Some("sk-test")).unwrap();
        assert_eq!(client.provider_name(), "openai");

        let missing = create_client("openai", None, None);
        assert!(matches!(missing, Err(AppError::Config(_))));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result = create_client("claude", None, None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
