//! Retrieval pipeline type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single extracted document page.
///
/// Produced by the external extractor; the pipeline never touches the
/// source document format, only the per-page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    pub number: u32,

    /// Extracted page text (may be empty)
    pub text: String,
}

impl Page {
    /// Create a page from its number and extracted text.
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// A bounded text segment derived from one or more pages, the unit of
/// retrieval. Chunks are read-only and regenerated whenever the source
/// page set changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Position of this chunk within its chunk set
    pub ordinal: u32,

    /// Page number(s) the chunk text originated from
    pub pages: Vec<u32>,

    /// Chunk text
    pub text: String,
}

/// Chunking parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkParams {
    /// Maximum chunk length in characters
    pub max_chunk_chars: usize,

    /// Shared text between consecutive chunks of the same page
    pub overlap_chars: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            max_chunk_chars: 1000,
            overlap_chars: 200,
        }
    }
}

/// How chunks are selected for one question.
///
/// Selected by the caller and applied fresh on every call; the only
/// state carried between questions lives in
/// [`SessionContext`](crate::session::SessionContext).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Run a fresh similarity search over the whole document
    FreshSearch,

    /// Re-use the chunks retrieved for the previous question
    Continuation,

    /// Fresh similarity search restricted to an explicit page subset
    PageScoped(BTreeSet<u32>),

    /// Skip retrieval entirely; answer from the model's own knowledge
    Bypass,
}

/// Chunks retrieved for one question, closest-first.
///
/// Transient except that the most recent result is retained in the
/// session for continuation queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Retrieval {
    /// Retrieved chunks, ordered by descending relevance
    pub chunks: Vec<DocumentChunk>,

    /// Similarity score per chunk, aligned with `chunks`
    pub scores: Vec<f32>,
}

impl Retrieval {
    /// An empty retrieval (used by bypass mode).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no chunks were retrieved.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
