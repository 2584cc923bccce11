//! In-memory embedding index over document chunks.
//!
//! A [`VectorIndex`] owns one chunk set and its embeddings and answers
//! cosine-similarity queries. A [`DocumentIndex`] aggregates the source
//! pages with the full-document index and one cached page-scoped index;
//! indices are immutable once built and replaced, never mutated, when
//! the page subset changes.

use crate::chunker;
use crate::embeddings::EmbeddingProvider;
use crate::types::{ChunkParams, DocumentChunk, Page};
use askdoc_core::{AppError, AppResult};
use std::collections::BTreeSet;

/// Default number of neighbors returned by a similarity query.
pub const DEFAULT_TOP_K: usize = 4;

/// Searchable collection of (chunk, embedding) pairs for one chunk set.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    chunks: Vec<DocumentChunk>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl VectorIndex {
    /// Build an index by embedding every chunk in one batched pass.
    ///
    /// All-or-nothing: if the embedding capability fails or returns a
    /// vector of the wrong dimension, no partial index escapes.
    pub async fn build(
        chunks: Vec<DocumentChunk>,
        embedder: &dyn EmbeddingProvider,
    ) -> AppResult<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;

        if vectors.len() != chunks.len() {
            return Err(AppError::EmbeddingUnavailable(format!(
                "Embedding capability returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let dimensions = embedder.dimensions();
        for vector in &vectors {
            if vector.len() != dimensions {
                return Err(AppError::EmbeddingUnavailable(format!(
                    "Embedding dimension mismatch: got {}, expected {}",
                    vector.len(),
                    dimensions
                )));
            }
        }

        tracing::debug!(
            "Built index over {} chunks ({} dimensions)",
            chunks.len(),
            dimensions
        );

        Ok(Self {
            chunks,
            vectors,
            dimensions,
        })
    }

    /// Number of chunks in the index.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Embedding dimension of the stored vectors.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The indexed chunks, in chunking order.
    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    /// The stored embedding vectors, aligned with [`Self::chunks`].
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Query the top-k chunks most similar to a question.
    ///
    /// Embeds the question once, scores every stored vector by cosine
    /// similarity, and returns at most `k` results by descending score.
    /// Ties break by ascending chunk ordinal, so results are stable.
    pub async fn query(
        &self,
        question: &str,
        k: usize,
        embedder: &dyn EmbeddingProvider,
    ) -> AppResult<Vec<(DocumentChunk, f32)>> {
        let query_embedding = embedder.embed(question).await?;
        Ok(self.query_embedding(&query_embedding, k))
    }

    /// Query against an already computed question embedding.
    pub fn query_embedding(&self, query: &[f32], k: usize) -> Vec<(DocumentChunk, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, vector)| (i, cosine_similarity(query, vector)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        tracing::debug!("Retrieved {} chunks (requested top-{})", scored.len(), k);

        scored
            .into_iter()
            .map(|(i, score)| (self.chunks[i].clone(), score))
            .collect()
    }
}

/// Aggregate owning one document's pages and its cached indices.
///
/// The full-document index is built once; page-scoped indices are built
/// on demand and the most recent one is cached under its page subset.
pub struct DocumentIndex {
    pages: Vec<Page>,
    params: ChunkParams,
    full: VectorIndex,
    scoped: Option<(BTreeSet<u32>, VectorIndex)>,
}

impl DocumentIndex {
    /// Chunk and embed the whole document.
    pub async fn build(
        pages: Vec<Page>,
        params: ChunkParams,
        embedder: &dyn EmbeddingProvider,
    ) -> AppResult<Self> {
        let chunks = chunker::chunk_pages(&pages, &params)?;
        let full = VectorIndex::build(chunks, embedder).await?;

        Ok(Self {
            pages,
            params,
            full,
            scoped: None,
        })
    }

    /// The full-document index.
    pub fn full(&self) -> &VectorIndex {
        &self.full
    }

    /// Page numbers present in the document.
    pub fn page_numbers(&self) -> BTreeSet<u32> {
        self.pages.iter().map(|p| p.number).collect()
    }

    /// Get the index restricted to a page subset, building and caching
    /// it when the subset differs from the cached one.
    ///
    /// Returns the scoped index and whether it was rebuilt (a rebuild
    /// invalidates any continuation state tied to the previous subset).
    ///
    /// Fails with `InvalidSelection` if the subset is empty or names a
    /// page the document does not have.
    pub async fn scoped(
        &mut self,
        subset: &BTreeSet<u32>,
        embedder: &dyn EmbeddingProvider,
    ) -> AppResult<(&VectorIndex, bool)> {
        if subset.is_empty() {
            return Err(AppError::InvalidSelection(
                "no pages selected".to_string(),
            ));
        }

        let known = self.page_numbers();
        let missing: Vec<u32> = subset.difference(&known).copied().collect();
        if !missing.is_empty() {
            return Err(AppError::InvalidSelection(format!(
                "document has no page(s) {:?}",
                missing
            )));
        }

        let cached = matches!(&self.scoped, Some((pages, _)) if pages == subset);
        if !cached {
            let selected: Vec<Page> = self
                .pages
                .iter()
                .filter(|p| subset.contains(&p.number))
                .cloned()
                .collect();

            let chunks = chunker::chunk_pages(&selected, &self.params)?;
            let index = VectorIndex::build(chunks, embedder).await?;

            tracing::info!(
                "Built page-scoped index over pages {:?} ({} chunks)",
                subset,
                index.len()
            );

            self.scoped = Some((subset.clone(), index));
        }

        match &self.scoped {
            Some((_, index)) => Ok((index, !cached)),
            // populated above whenever the cache missed
            None => Err(AppError::InvalidSelection(
                "page-scoped index unavailable".to_string(),
            )),
        }
    }
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
