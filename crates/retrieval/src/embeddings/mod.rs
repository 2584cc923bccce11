//! Embedding capability for the retrieval pipeline.
//!
//! Provider-agnostic embedding generation behind an async trait, with a
//! factory keyed by provider name.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
