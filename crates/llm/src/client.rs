//! Generative client abstraction and request/response types.
//!
//! The answer synthesizer talks to [`LlmClient`] and never to a concrete
//! provider; everything provider-specific lives under `providers`.

use askdoc_core::AppResult;
use serde::{Deserialize, Serialize};

/// One completion request.
///
/// Built with the `with_*` combinators; `deterministic()` pins decoding
/// to temperature 0, which the retrieval pipeline uses for every
/// synthesized answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// User-facing prompt text
    pub prompt: String,

    /// Model identifier (e.g., "llama3.2", "gpt-4o-mini")
    pub model: String,

    /// Optional generation cap, in tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Optional sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Optional system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl LlmRequest {
    /// A bare request for `prompt` against `model`.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            system: None,
        }
    }

    /// Cap the number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Choose a sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Attach a system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Pin decoding to temperature 0 for reproducible answers.
    pub fn deterministic(self) -> Self {
        self.with_temperature(0.0)
    }
}

/// One completed generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text
    pub content: String,

    /// Model that produced it
    pub model: String,

    /// Token accounting
    pub usage: LlmUsage,
}

/// Token accounting for a completion.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmUsage {
    /// Tokens consumed by the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens generated
    #[serde(default)]
    pub completion_tokens: u32,

    /// Sum of both
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Usage from prompt and completion counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for generative providers.
///
/// Provider failures surface as `AppError::GenerationUnavailable` and
/// are never retried by callers.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name (e.g., "ollama", "openai").
    fn provider_name(&self) -> &str;

    /// Run one completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}
