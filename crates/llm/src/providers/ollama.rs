//! Ollama LLM provider implementation.
//!
//! Talks to the chat endpoint of Ollama, a local LLM runtime. The chat
//! API carries the system/user message pair and sampling options
//! natively, so no prompt stitching happens here.
//! API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use askdoc_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const CHAT_ENDPOINT: &str = "/api/chat";

/// Ollama chat request payload.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<SamplingOptions>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Sampling options; Ollama reads these from a nested `options` object.
#[derive(Debug, Serialize)]
struct SamplingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama chat response payload.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    message: ResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Ollama LLM client.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client against the default local endpoint.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OLLAMA_URL)
    }

    /// Create a client against a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Map an [`LlmRequest`] onto the chat payload.
    fn chat_request<'a>(&self, request: &'a LlmRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);

        if let Some(system) = request.system.as_deref() {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }

        messages.push(Message {
            role: "user",
            content: &request.prompt,
        });

        let options = (request.temperature.is_some() || request.max_tokens.is_some()).then(|| {
            SamplingOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            }
        });

        ChatRequest {
            model: &request.model,
            messages,
            options,
            stream: false,
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to Ollama");

        let url = format!("{}{}", self.base_url, CHAT_ENDPOINT);
        let payload = self.chat_request(request);

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                AppError::GenerationUnavailable(format!("Failed to reach Ollama: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::GenerationUnavailable(format!(
                "Ollama API error ({}): {}",
                status, body
            )));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            AppError::GenerationUnavailable(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::info!("Received completion from Ollama");

        Ok(LlmResponse {
            content: chat.message.content,
            model: chat.model,
            usage: LlmUsage::new(
                chat.prompt_eval_count.unwrap_or(0),
                chat.eval_count.unwrap_or(0),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let client = OllamaClient::new();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url, DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_chat_request_carries_system_and_options() {
        let client = OllamaClient::new();
        let request = LlmRequest::new("Hello", "llama3.2")
            .with_system("Be terse.")
            .with_max_tokens(100)
            .deterministic();

        let payload = client.chat_request(&request);
        assert_eq!(payload.model, "llama3.2");
        assert_eq!(payload.messages.len(), 2);
        assert_eq!(payload.messages[0].role, "system");
        assert_eq!(payload.messages[1].content, "Hello");
        assert!(!payload.stream);

        let options = payload.options.unwrap();
        assert_eq!(options.temperature, Some(0.0));
        assert_eq!(options.num_predict, Some(100));
    }

    #[test]
    fn test_bare_request_omits_options() {
        let client = OllamaClient::new();
        let request = LlmRequest::new("Hello", "llama3.2");

        let payload = client.chat_request(&request);
        assert_eq!(payload.messages.len(), 1);
        assert!(payload.options.is_none());
    }
}
