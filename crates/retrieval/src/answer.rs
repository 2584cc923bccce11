//! Answer synthesis from retrieved chunks.
//!
//! Feeds the retrieved context and the question to the generative
//! capability with deterministic decoding, then applies the unknown-
//! answer presentation policy to the raw output.

use crate::types::{DocumentChunk, Retrieval, RetrievalMode};
use askdoc_core::AppResult;
use askdoc_llm::{LlmClient, LlmRequest};

/// Fixed sentence the strict-context prompt tells the model to emit when
/// the context does not contain the answer.
pub const UNKNOWN_MARKER: &str = "I could not find this information in the provided document.";

/// Canned replacement shown when the marker appears in the raw answer.
pub const FALLBACK_MESSAGE: &str = "The document does not seem to contain an answer to this \
question. Switch to external-knowledge mode to answer from the model's general knowledge instead.";

/// Presentation policy for unknown answers.
///
/// Marker detection is substring matching on the model's free-text
/// output, which is inherently brittle; both the trigger sentence and
/// the replacement are configurable rather than hard-coded.
#[derive(Debug, Clone)]
pub struct SynthesisPolicy {
    /// Case-sensitive marker detected in the raw model output
    pub unknown_marker: String,

    /// Message substituted for the whole answer when the marker appears
    pub fallback_message: String,

    /// Cap on generated tokens
    pub max_tokens: Option<u32>,
}

impl Default for SynthesisPolicy {
    fn default() -> Self {
        Self {
            unknown_marker: UNKNOWN_MARKER.to_string(),
            fallback_message: FALLBACK_MESSAGE.to_string(),
            max_tokens: Some(1000),
        }
    }
}

/// Generate an answer for a question from its retrieved chunks.
///
/// In bypass mode no context block or strict-context instruction is
/// issued and the model answers from its own knowledge. Decoding is
/// pinned to temperature 0 for reproducibility. Provider failures
/// surface as `GenerationUnavailable` without retry.
pub async fn synthesize(
    llm: &dyn LlmClient,
    model: &str,
    question: &str,
    retrieval: &Retrieval,
    mode: &RetrievalMode,
    policy: &SynthesisPolicy,
) -> AppResult<String> {
    let mut request = if matches!(mode, RetrievalMode::Bypass) {
        LlmRequest::new(question, model)
    } else {
        let context = build_context(&retrieval.chunks);
        let user_prompt = format!(
            "Question:\n{}\n\nDocument context:\n{}",
            question, context
        );

        LlmRequest::new(user_prompt, model).with_system(build_system_prompt(&policy.unknown_marker))
    };

    request = request.deterministic();
    if let Some(max_tokens) = policy.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }

    tracing::debug!(
        "Synthesizing answer from {} chunks (provider: {})",
        retrieval.chunks.len(),
        llm.provider_name()
    );

    let response = llm.complete(&request).await?;

    if response.content.contains(&policy.unknown_marker) {
        tracing::info!("Model reported no answer in the document; substituting fallback");
        return Ok(policy.fallback_message.clone());
    }

    Ok(response.content)
}

/// Build the context block from chunks, in the order provided.
fn build_context(chunks: &[DocumentChunk]) -> String {
    let context_parts: Vec<String> = chunks
        .iter()
        .map(|chunk| format!("[{}]\n{}", format_pages(&chunk.pages), chunk.text))
        .collect();

    context_parts.join("\n\n---\n\n")
}

/// Human-readable page label for a chunk.
fn format_pages(pages: &[u32]) -> String {
    match pages {
        [single] => format!("Page {}", single),
        many => format!(
            "Pages {}",
            many.iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Build the strict-context system prompt.
fn build_system_prompt(unknown_marker: &str) -> String {
    format!(
        "You are a document question-answering assistant.\n\n\
         Instructions:\n\
         - Answer using only the document context provided below\n\
         - Answer as if you had read the document directly; do not mention \
         the words \"context\", \"chunk\", or \"excerpt\"\n\
         - If the context does not contain the answer, state: \"{}\"\n\
         - Keep your response concise and factual\n",
        unknown_marker
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use askdoc_core::AppError;
    use askdoc_llm::{LlmResponse, LlmUsage};
    use std::sync::Mutex;

    /// Stub generative capability returning a fixed reply and recording
    /// the request it received.
    struct StubLlm {
        reply: String,
        seen: Mutex<Option<LlmRequest>>,
    }

    impl StubLlm {
        fn new(reply: impl Into<String>) -> Self {
            Self {
                reply: reply.into(),
                seen: Mutex::new(None),
            }
        }

        fn last_request(&self) -> LlmRequest {
            self.seen.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for StubLlm {
        fn provider_name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            *self.seen.lock().unwrap() = Some(request.clone());
            Ok(LlmResponse {
                content: self.reply.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    /// Stub that always fails, for error propagation tests.
    struct FailingLlm;

    #[async_trait::async_trait]
    impl LlmClient for FailingLlm {
        fn provider_name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
            Err(AppError::GenerationUnavailable("connection refused".to_string()))
        }
    }

    fn retrieval_with(texts: &[&str]) -> Retrieval {
        Retrieval {
            chunks: texts
                .iter()
                .enumerate()
                .map(|(i, text)| DocumentChunk {
                    ordinal: i as u32,
                    pages: vec![i as u32 + 1],
                    text: text.to_string(),
                })
                .collect(),
            scores: vec![0.9; texts.len()],
        }
    }

    #[tokio::test]
    async fn test_context_preserves_chunk_order() {
        let llm = StubLlm::new("the answer");
        let retrieval = retrieval_with(&["first chunk", "second chunk"]);

        let answer = synthesize(
            &llm,
            "test-model",
            "what?",
            &retrieval,
            &RetrievalMode::FreshSearch,
            &SynthesisPolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(answer, "the answer");

        let request = llm.last_request();
        let first = request.prompt.find("first chunk").unwrap();
        let second = request.prompt.find("second chunk").unwrap();
        assert!(first < second, "context must keep retrieval order");
        assert!(request.prompt.contains("[Page 1]"));
        assert_eq!(request.temperature, Some(0.0));
        assert!(request.system.is_some());
    }

    #[tokio::test]
    async fn test_bypass_issues_no_context_instruction() {
        let llm = StubLlm::new("from my own knowledge");
        let retrieval = Retrieval::empty();

        let answer = synthesize(
            &llm,
            "test-model",
            "who wrote hamlet?",
            &retrieval,
            &RetrievalMode::Bypass,
            &SynthesisPolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(answer, "from my own knowledge");

        let request = llm.last_request();
        assert!(request.system.is_none());
        assert_eq!(request.prompt, "who wrote hamlet?");
        assert_eq!(request.temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_unknown_marker_becomes_fallback_verbatim() {
        let llm = StubLlm::new(UNKNOWN_MARKER);
        let retrieval = retrieval_with(&["irrelevant text"]);

        let answer = synthesize(
            &llm,
            "test-model",
            "what is the meaning of life?",
            &retrieval,
            &RetrievalMode::FreshSearch,
            &SynthesisPolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(answer, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_marker_match_is_case_sensitive() {
        let llm = StubLlm::new("i could not find this information in the provided document.");
        let retrieval = retrieval_with(&["text"]);

        let answer = synthesize(
            &llm,
            "test-model",
            "question",
            &retrieval,
            &RetrievalMode::FreshSearch,
            &SynthesisPolicy::default(),
        )
        .await
        .unwrap();

        // Lowercased text is not the marker; the raw answer passes through
        assert_ne!(answer, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_custom_policy_marker() {
        let llm = StubLlm::new("NO ANSWER FOUND");
        let retrieval = retrieval_with(&["text"]);
        let policy = SynthesisPolicy {
            unknown_marker: "NO ANSWER FOUND".to_string(),
            fallback_message: "try asking differently".to_string(),
            max_tokens: None,
        };

        let answer = synthesize(
            &llm,
            "test-model",
            "question",
            &retrieval,
            &RetrievalMode::FreshSearch,
            &policy,
        )
        .await
        .unwrap();

        assert_eq!(answer, "try asking differently");
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let retrieval = retrieval_with(&["text"]);

        let result = synthesize(
            &FailingLlm,
            "test-model",
            "question",
            &retrieval,
            &RetrievalMode::FreshSearch,
            &SynthesisPolicy::default(),
        )
        .await;

        assert!(matches!(result, Err(AppError::GenerationUnavailable(_))));
    }

    #[test]
    fn test_system_prompt_embeds_marker() {
        let prompt = build_system_prompt("CUSTOM MARKER");
        assert!(prompt.contains("\"CUSTOM MARKER\""));
        assert!(prompt.contains("only the document context"));
    }

    #[test]
    fn test_page_labels() {
        assert_eq!(format_pages(&[3]), "Page 3");
        assert_eq!(format_pages(&[2, 3]), "Pages 2, 3");
    }
}
