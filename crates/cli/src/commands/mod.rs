//! Command handlers for the askdoc CLI.

pub mod ask;
pub mod chat;

pub use ask::AskCommand;
pub use chat::ChatCommand;

use askdoc_core::{config::AppConfig, AppResult};
use askdoc_retrieval::{create_provider, AskEngine, ChunkParams};

/// Wire the configured capabilities into an engine.
pub(crate) fn build_engine(config: &AppConfig) -> AppResult<AskEngine> {
    let api_key = config.resolve_api_key();

    let embedder = create_provider(
        &config.embedding_provider,
        &config.embedding_model,
        config.embedding_dim,
        config.embedding_endpoint.as_deref(),
        api_key.as_deref(),
    )?;

    let llm = askdoc_llm::create_client(
        &config.provider,
        config.endpoint.as_deref(),
        api_key.as_deref(),
    )?;

    Ok(AskEngine::new(embedder, llm, config.model.clone()).with_chunking(ChunkParams {
        max_chunk_chars: config.max_chunk_chars,
        overlap_chars: config.overlap_chars,
    }))
}
