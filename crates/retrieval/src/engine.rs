//! The narrow interface the UI layer calls into.
//!
//! [`AskEngine`] owns the two external capabilities (embedding and
//! generation) and exposes exactly three operations: build an index for
//! an extracted document, answer one question against it, and reset a
//! session. Everything else in this crate is plumbing behind these.

use crate::answer::{self, SynthesisPolicy};
use crate::embeddings::EmbeddingProvider;
use crate::index::DocumentIndex;
use crate::policy;
use crate::session::SessionContext;
use crate::types::{ChunkParams, Page, RetrievalMode};
use askdoc_core::AppResult;
use askdoc_llm::LlmClient;
use std::sync::Arc;

/// Facade over the retrieval pipeline.
pub struct AskEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmClient>,
    model: String,
    chunking: ChunkParams,
    synthesis: SynthesisPolicy,
}

impl AskEngine {
    /// Create an engine from its two capabilities and the generation
    /// model identifier.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            llm,
            model: model.into(),
            chunking: ChunkParams::default(),
            synthesis: SynthesisPolicy::default(),
        }
    }

    /// Override the chunking parameters.
    pub fn with_chunking(mut self, chunking: ChunkParams) -> Self {
        self.chunking = chunking;
        self
    }

    /// Override the unknown-answer presentation policy.
    pub fn with_synthesis(mut self, synthesis: SynthesisPolicy) -> Self {
        self.synthesis = synthesis;
        self
    }

    /// Chunk and embed an extracted document.
    ///
    /// Called once per document (the caller re-invokes it, with a fresh
    /// session, when the document changes).
    pub async fn build_index(&self, pages: Vec<Page>) -> AppResult<DocumentIndex> {
        tracing::info!(
            "Building index over {} pages (embedding: {}/{})",
            pages.len(),
            self.embedder.provider_name(),
            self.embedder.model_name()
        );

        DocumentIndex::build(pages, self.chunking, self.embedder.as_ref()).await
    }

    /// Answer one question in the requested retrieval mode.
    ///
    /// Session continuation state is committed only after synthesis
    /// succeeds; a failed question leaves the session untouched.
    pub async fn ask(
        &self,
        question: &str,
        mode: &RetrievalMode,
        index: &mut DocumentIndex,
        session: &mut SessionContext,
    ) -> AppResult<String> {
        tracing::info!("Answering question: {}", question);

        let plan =
            policy::retrieve(question, mode, index, session, self.embedder.as_ref()).await?;

        let answer = answer::synthesize(
            self.llm.as_ref(),
            &self.model,
            question,
            &plan.retrieval,
            mode,
            &self.synthesis,
        )
        .await?;

        plan.commit(session);

        Ok(answer)
    }

    /// Clear a session's continuation state and chat history.
    pub fn reset(&self, session: &mut SessionContext) {
        session.reset();
    }
}
