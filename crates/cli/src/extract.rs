//! Plain-text page extraction.
//!
//! The retrieval pipeline only consumes per-page strings; this module is
//! the extractor that produces them. Documents are plain text with
//! form-feed (`\f`) page separators, the convention used by `pdftotext`
//! and friends; a file without separators is a single page.

use askdoc_core::{AppError, AppResult};
use askdoc_retrieval::Page;
use std::collections::BTreeSet;
use std::path::Path;

/// Form-feed character separating pages in extracted text.
const PAGE_SEPARATOR: char = '\u{0C}';

/// Extract pages from a plain-text document.
///
/// Pages are numbered from 1 in file order. An empty page between two
/// separators is preserved so page numbering matches the source. Fails
/// with `InvalidInput` if the document contains no text at all.
pub fn extract_pages(path: &Path) -> AppResult<Vec<Page>> {
    let text = std::fs::read_to_string(path)?;

    if text.trim().is_empty() {
        return Err(AppError::InvalidInput(format!(
            "document {:?} contains no text",
            path
        )));
    }

    let pages: Vec<Page> = text
        .split(PAGE_SEPARATOR)
        .enumerate()
        .map(|(i, page_text)| Page::new(i as u32 + 1, page_text.trim_matches('\n')))
        .collect();

    tracing::info!("Extracted {} pages from {:?}", pages.len(), path);

    Ok(pages)
}

/// Parse a page selector like `2,4-6` into a page-number set.
///
/// Fails with `InvalidSelection` on malformed entries, zero page
/// numbers, or descending ranges.
pub fn parse_page_selector(selector: &str) -> AppResult<BTreeSet<u32>> {
    let mut pages = BTreeSet::new();

    for entry in selector.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(AppError::InvalidSelection(format!(
                "empty entry in page selector '{}'",
                selector
            )));
        }

        if let Some((start, end)) = entry.split_once('-') {
            let start = parse_page_number(start)?;
            let end = parse_page_number(end)?;
            if start > end {
                return Err(AppError::InvalidSelection(format!(
                    "descending page range '{}'",
                    entry
                )));
            }
            pages.extend(start..=end);
        } else {
            pages.insert(parse_page_number(entry)?);
        }
    }

    Ok(pages)
}

fn parse_page_number(s: &str) -> AppResult<u32> {
    let number: u32 = s.trim().parse().map_err(|_| {
        AppError::InvalidSelection(format!("invalid page number '{}'", s.trim()))
    })?;

    if number == 0 {
        return Err(AppError::InvalidSelection(
            "page numbers start at 1".to_string(),
        ));
    }

    Ok(number)
}
