//! Retrieval pipeline for askdoc.
//!
//! Turns one extracted document into an embedding index and answers
//! questions against it: page-aware chunking, cosine similarity search,
//! per-question retrieval modes (fresh search, same-page continuation,
//! page-scoped search, bypass), and LLM answer synthesis.

pub mod answer;
pub mod chunker;
pub mod embeddings;
pub mod engine;
pub mod index;
pub mod policy;
pub mod session;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use answer::SynthesisPolicy;
pub use embeddings::{create_provider, EmbeddingProvider};
pub use engine::AskEngine;
pub use index::{DocumentIndex, VectorIndex, DEFAULT_TOP_K};
pub use policy::MAX_CONTEXT_CHUNKS;
pub use session::{Role, SessionContext, Turn};
pub use types::{ChunkParams, DocumentChunk, Page, Retrieval, RetrievalMode};
