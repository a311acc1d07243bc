//! Error types for AskDocs.
//!
//! A single error enum covers every stage of the pipeline: configuration,
//! document loading, embedding, index persistence, retrieval, prompt
//! composition and answer generation.

use thiserror::Error;

/// Unified error type for AskDocs.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Query-time variants are converted into user-facing messages at the
/// pipeline boundary; build-time variants are fatal.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source directory missing or a document could not be read
    #[error("Load error: {0}")]
    Load(String),

    /// Embedding gateway unreachable or returned an invalid vector
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index persistence or search errors
    #[error("Index error: {0}")]
    Index(String),

    /// Query-time retrieval failure (wraps the embedding or index cause)
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Completion service failure
    #[error("Generation error: {0}")]
    Generation(String),

    /// Prompt definition or rendering errors
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
    /// Wrap any error raised while answering a query as a retrieval error.
    ///
    /// Retrieval errors are passed through unchanged so the cause is not
    /// prefixed twice.
    pub fn into_retrieval(self) -> Self {
        match self {
            AppError::Retrieval(_) => self,
            other => AppError::Retrieval(other.to_string()),
        }
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
