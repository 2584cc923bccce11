//! Page-aware text chunking with configurable size and overlap.
//!
//! Pages are split at their boundaries first, so a chunk never spans two
//! pages without need; only pages longer than the chunk limit are windowed.

use crate::types::{ChunkParams, DocumentChunk, Page};
use askdoc_core::{AppError, AppResult};

/// Chunk extracted pages into retrieval units.
///
/// Pages are processed in page-number order. A page that fits within
/// `max_chunk_chars` becomes a single chunk; a longer page is windowed
/// into successive chunks sharing `overlap_chars` of text, split on
/// UTF-8 character boundaries. An empty page still occupies a chunk so
/// page bookkeeping is never skipped.
///
/// Fails with `InvalidInput` if `pages` is empty or the overlap is not
/// smaller than the chunk size.
pub fn chunk_pages(pages: &[Page], params: &ChunkParams) -> AppResult<Vec<DocumentChunk>> {
    if pages.is_empty() {
        return Err(AppError::InvalidInput("no pages to chunk".to_string()));
    }

    if params.overlap_chars >= params.max_chunk_chars {
        return Err(AppError::InvalidInput(format!(
            "overlap_chars ({}) must be smaller than max_chunk_chars ({})",
            params.overlap_chars, params.max_chunk_chars
        )));
    }

    let mut ordered: Vec<&Page> = pages.iter().collect();
    ordered.sort_by_key(|p| p.number);

    let mut chunks = Vec::new();
    let mut ordinal = 0u32;

    for page in ordered {
        if page.text.len() <= params.max_chunk_chars {
            chunks.push(DocumentChunk {
                ordinal,
                pages: vec![page.number],
                text: page.text.clone(),
            });
            ordinal += 1;
            continue;
        }

        let text = &page.text;
        let mut start = 0;

        while start < text.len() {
            // Find a valid UTF-8 boundary for the window end
            let mut end = (start + params.max_chunk_chars).min(text.len());
            while end > start && !text.is_char_boundary(end) {
                end -= 1;
            }

            chunks.push(DocumentChunk {
                ordinal,
                pages: vec![page.number],
                text: text[start..end].to_string(),
            });
            ordinal += 1;

            if end == text.len() {
                break;
            }

            // Step forward by (size - overlap), never past the window end,
            // so no text falls between consecutive windows
            let step = params.max_chunk_chars - params.overlap_chars;
            let mut next_start = (start + step).min(end);
            while next_start < text.len() && !text.is_char_boundary(next_start) {
                next_start += 1;
            }
            start = next_start;
        }
    }

    tracing::debug!(
        "Chunked {} pages into {} chunks (max: {}, overlap: {})",
        pages.len(),
        chunks.len(),
        params.max_chunk_chars,
        params.overlap_chars
    );

    Ok(chunks)
}
