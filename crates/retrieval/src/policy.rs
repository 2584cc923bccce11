//! Retrieval policy: per-question mode dispatch.
//!
//! The caller picks a [`RetrievalMode`] for every question; nothing about
//! the mode is remembered between calls beyond what lives in
//! [`SessionContext`]. Session updates are deferred into a
//! [`RetrievalPlan`] and committed only after the full question/answer
//! cycle succeeds, so a failed question never corrupts continuation state.

use crate::embeddings::EmbeddingProvider;
use crate::index::{DocumentIndex, DEFAULT_TOP_K};
use crate::session::SessionContext;
use crate::types::{DocumentChunk, Retrieval, RetrievalMode};
use askdoc_core::AppResult;
use std::collections::BTreeSet;

/// Maximum number of chunks handed to the synthesizer.
///
/// Similarity search may return more (see [`DEFAULT_TOP_K`]); only the
/// highest-scoring chunks survive.
pub const MAX_CONTEXT_CHUNKS: usize = 3;

/// Retrieval outcome plus the session update to commit once the whole
/// question/answer cycle succeeds.
#[derive(Debug)]
pub struct RetrievalPlan {
    /// Chunks to synthesize the answer from, closest-first
    pub retrieval: Retrieval,
    update: SessionUpdate,
}

#[derive(Debug)]
enum SessionUpdate {
    /// Leave the session untouched
    None,

    /// Overwrite the default chain's slot and return to the default chain
    Default(Retrieval),

    /// Overwrite the page-scoped chain's slot
    Scoped(BTreeSet<u32>, Retrieval),
}

impl RetrievalPlan {
    /// Apply the deferred session update.
    pub fn commit(self, session: &mut SessionContext) {
        match self.update {
            SessionUpdate::None => {}
            SessionUpdate::Default(retrieval) => {
                session.set_last_retrieval(retrieval);
                session.clear_active_pages();
            }
            SessionUpdate::Scoped(pages, retrieval) => {
                session.set_scoped_last_retrieval(pages, retrieval);
            }
        }
    }
}

/// Select the chunks for one question according to the requested mode.
pub async fn retrieve(
    question: &str,
    mode: &RetrievalMode,
    index: &mut DocumentIndex,
    session: &SessionContext,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<RetrievalPlan> {
    match mode {
        RetrievalMode::Bypass => Ok(RetrievalPlan {
            retrieval: Retrieval::empty(),
            update: SessionUpdate::None,
        }),
        RetrievalMode::FreshSearch => fresh_search(question, index, embedder).await,
        RetrievalMode::PageScoped(subset) => {
            page_scoped(question, subset, index, embedder).await
        }
        RetrievalMode::Continuation => continuation(question, index, session, embedder).await,
    }
}

/// Fresh similarity search over the whole document.
async fn fresh_search(
    question: &str,
    index: &DocumentIndex,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<RetrievalPlan> {
    let results = index.full().query(question, DEFAULT_TOP_K, embedder).await?;
    let retrieval = cap_results(results);

    Ok(RetrievalPlan {
        retrieval: retrieval.clone(),
        update: SessionUpdate::Default(retrieval),
    })
}

/// Fresh similarity search restricted to a page subset.
async fn page_scoped(
    question: &str,
    subset: &BTreeSet<u32>,
    index: &mut DocumentIndex,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<RetrievalPlan> {
    let (scoped, _rebuilt) = index.scoped(subset, embedder).await?;
    let results = scoped.query(question, DEFAULT_TOP_K, embedder).await?;
    let retrieval = cap_results(results);

    Ok(RetrievalPlan {
        retrieval: retrieval.clone(),
        update: SessionUpdate::Scoped(subset.clone(), retrieval),
    })
}

/// Re-use the previous retrieval of whichever chain the session is on.
///
/// With no prior context the question falls back to fresh-search
/// semantics on the same chain.
async fn continuation(
    question: &str,
    index: &mut DocumentIndex,
    session: &SessionContext,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<RetrievalPlan> {
    if let Some(subset) = session.active_pages().cloned() {
        if let Some(prior) = session.scoped_last_retrieval() {
            if !prior.is_empty() {
                tracing::debug!(
                    "Continuing with {} chunks from pages {:?}",
                    prior.chunks.len(),
                    subset
                );
                return Ok(RetrievalPlan {
                    retrieval: prior.clone(),
                    update: SessionUpdate::None,
                });
            }
        }

        tracing::warn!(
            "No prior page-scoped context; falling back to a fresh search over pages {:?}",
            subset
        );
        return page_scoped(question, &subset, index, embedder).await;
    }

    if let Some(prior) = session.last_retrieval() {
        if !prior.is_empty() {
            tracing::debug!(
                "Continuing with {} previously retrieved chunks",
                prior.chunks.len()
            );
            return Ok(RetrievalPlan {
                retrieval: prior.clone(),
                update: SessionUpdate::None,
            });
        }
    }

    tracing::warn!("No prior retrieval context; falling back to a fresh search");
    fresh_search(question, index, embedder).await
}

/// Truncate search results to the context cap, keeping the best scores.
fn cap_results(results: Vec<(DocumentChunk, f32)>) -> Retrieval {
    let mut chunks = Vec::new();
    let mut scores = Vec::new();

    for (chunk, score) in results.into_iter().take(MAX_CONTEXT_CHUNKS) {
        chunks.push(chunk);
        scores.push(score);
    }

    Retrieval { chunks, scores }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::MockProvider;
    use crate::types::{ChunkParams, Page};
    use askdoc_core::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock embedder that counts how many texts it embeds.
    #[derive(Debug)]
    struct CountingEmbedder {
        inner: MockProvider,
        calls: AtomicUsize,
    }

    impl CountingEmbedder {
        fn new(dimensions: usize) -> Self {
            Self {
                inner: MockProvider::new(dimensions),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        fn provider_name(&self) -> &str {
            "counting-mock"
        }

        fn model_name(&self) -> &str {
            self.inner.model_name()
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(texts.len(), Ordering::SeqCst);
            self.inner.embed_batch(texts).await
        }
    }

    fn five_pages() -> Vec<Page> {
        vec![
            Page::new(1, "whales migrate across oceans every year"),
            Page::new(2, "volcanic eruptions reshape island coastlines"),
            Page::new(3, "honeybees communicate through waggle dances"),
            Page::new(4, "glaciers carve valleys over millennia"),
            Page::new(5, "auroras glow above polar regions"),
        ]
    }

    async fn build_index(embedder: &dyn EmbeddingProvider) -> DocumentIndex {
        DocumentIndex::build(five_pages(), ChunkParams::default(), embedder)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_bypass_is_always_empty() {
        let embedder = MockProvider::new(64);
        let mut index = build_index(&embedder).await;
        let session = SessionContext::new();

        let plan = retrieve(
            "anything at all",
            &RetrievalMode::Bypass,
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();

        assert!(plan.retrieval.is_empty());
    }

    #[tokio::test]
    async fn test_fresh_search_caps_at_three_chunks() {
        let embedder = MockProvider::new(64);
        let mut index = build_index(&embedder).await;
        let session = SessionContext::new();

        let plan = retrieve(
            "tell me about glaciers and valleys",
            &RetrievalMode::FreshSearch,
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();

        assert!(!plan.retrieval.is_empty());
        assert!(plan.retrieval.chunks.len() <= MAX_CONTEXT_CHUNKS);
    }

    #[tokio::test]
    async fn test_continuation_repeats_last_result_without_embedding() {
        let embedder = CountingEmbedder::new(64);
        let mut index = build_index(&embedder).await;
        let mut session = SessionContext::new();

        let plan = retrieve(
            "honeybee waggle dances",
            &RetrievalMode::FreshSearch,
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();
        let first = plan.retrieval.clone();
        plan.commit(&mut session);

        let calls_after_search = embedder.calls();

        let plan = retrieve(
            "and what else?",
            &RetrievalMode::Continuation,
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();

        assert_eq!(plan.retrieval, first, "continuation returns the same chunks");
        assert_eq!(
            embedder.calls(),
            calls_after_search,
            "continuation must not embed anything"
        );
    }

    #[tokio::test]
    async fn test_continuation_falls_back_to_fresh_search() {
        let embedder = MockProvider::new(64);
        let mut index = build_index(&embedder).await;
        let session = SessionContext::new();

        let plan = retrieve(
            "volcanic eruptions",
            &RetrievalMode::Continuation,
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();

        assert!(
            !plan.retrieval.is_empty(),
            "empty history falls back to a fresh search"
        );
    }

    #[tokio::test]
    async fn test_page_scoped_stays_inside_subset() {
        let embedder = MockProvider::new(64);
        let mut index = build_index(&embedder).await;
        let session = SessionContext::new();

        let subset = BTreeSet::from([2, 3]);
        let plan = retrieve(
            "volcanic eruptions and honeybees",
            &RetrievalMode::PageScoped(subset.clone()),
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();

        assert!(!plan.retrieval.is_empty());
        for chunk in &plan.retrieval.chunks {
            for page in &chunk.pages {
                assert!(subset.contains(page), "chunk from page {} escaped scope", page);
            }
        }
    }

    #[tokio::test]
    async fn test_page_scoped_rejects_empty_selection() {
        let embedder = MockProvider::new(64);
        let mut index = build_index(&embedder).await;
        let session = SessionContext::new();

        let result = retrieve(
            "anything",
            &RetrievalMode::PageScoped(BTreeSet::new()),
            &mut index,
            &session,
            &embedder,
        )
        .await;

        assert!(matches!(result, Err(AppError::InvalidSelection(_))));
    }

    #[tokio::test]
    async fn test_scoped_chain_does_not_disturb_default_chain() {
        let embedder = MockProvider::new(64);
        let mut index = build_index(&embedder).await;
        let mut session = SessionContext::new();

        let plan = retrieve(
            "whale migration",
            &RetrievalMode::FreshSearch,
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();
        let default_chain = plan.retrieval.clone();
        plan.commit(&mut session);

        let plan = retrieve(
            "auroras",
            &RetrievalMode::PageScoped(BTreeSet::from([5])),
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();
        plan.commit(&mut session);

        assert_eq!(
            session.last_retrieval(),
            Some(&default_chain),
            "page-scoped commit must leave the default chain untouched"
        );
    }

    #[tokio::test]
    async fn test_continuation_follows_scoped_chain() {
        let embedder = MockProvider::new(64);
        let mut index = build_index(&embedder).await;
        let mut session = SessionContext::new();

        let plan = retrieve(
            "honeybee communication",
            &RetrievalMode::PageScoped(BTreeSet::from([3])),
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();
        let scoped = plan.retrieval.clone();
        plan.commit(&mut session);

        let plan = retrieve(
            "tell me more",
            &RetrievalMode::Continuation,
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();

        assert_eq!(plan.retrieval, scoped);
    }

    #[tokio::test]
    async fn test_fresh_search_returns_to_default_chain() {
        let embedder = MockProvider::new(64);
        let mut index = build_index(&embedder).await;
        let mut session = SessionContext::new();

        let plan = retrieve(
            "auroras",
            &RetrievalMode::PageScoped(BTreeSet::from([5])),
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();
        plan.commit(&mut session);
        assert!(session.active_pages().is_some());

        let plan = retrieve(
            "glacier valleys",
            &RetrievalMode::FreshSearch,
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();
        plan.commit(&mut session);

        assert!(session.active_pages().is_none());
    }

    #[tokio::test]
    async fn test_uncommitted_plan_leaves_session_unchanged() {
        let embedder = MockProvider::new(64);
        let mut index = build_index(&embedder).await;
        let session = SessionContext::new();

        let _plan = retrieve(
            "whale migration",
            &RetrievalMode::FreshSearch,
            &mut index,
            &session,
            &embedder,
        )
        .await
        .unwrap();

        // The plan was never committed (as if synthesis had failed)
        assert!(session.last_retrieval().is_none());
    }
}
