//! Error types for Tableside.
//!
//! A single error enum covers every failure category in the service. The
//! variants mirror how each failure is handled: extraction and embedding
//! errors are local to one file or chunk, build errors leave the previous
//! index generation in place, and generation errors become apology text.

use thiserror::Error;

/// Unified error type for Tableside.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A corpus file could not be turned into text
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The embedding service failed for one input
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A whole index rebuild failed
    #[error("Build error: {0}")]
    Build(String),

    /// Similarity search could not run
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// The generation service failed or returned garbage
    #[error("Generation error: {0}")]
    Generation(String),

    /// The generation service stopped because it ran out of memory or resources
    #[error("Generation resources exhausted: {0}")]
    ResourceExhausted(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error came from the generation service (either subtype).
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation(_) | Self::ResourceExhausted(_))
    }
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
