//! Error types for askdoc.
//!
//! This module defines a unified error enum covering the retrieval
//! pipeline's failure taxonomy (invalid input, invalid page selection,
//! unavailable remote capabilities) together with configuration, I/O,
//! and serialization errors.

use thiserror::Error;

/// Unified error type for askdoc.
///
/// All fallible functions return `Result<T, AppError>`. Remote capability
/// failures are surfaced to the caller unmodified; there is no automatic
/// retry and no silent recovery.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed chunking parameters or an empty source document
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Empty or out-of-range page subset for page-scoped retrieval
    #[error("Invalid page selection: {0}")]
    InvalidSelection(String),

    /// The embedding capability failed
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The generative capability failed
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
