//! Error types for the Relief query service.
//!
//! This module defines a unified error enum covering the service's failure
//! taxonomy (invalid input, corpus, embedding, generation) plus the ambient
//! configuration, prompt, I/O and serialization errors.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the Relief workspace.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic; errors are represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// User-correctable request errors (e.g. an empty query)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Vector index or passage store missing, empty, or misaligned
    #[error("Corpus unavailable: {0}")]
    CorpusUnavailable(String),

    /// Embedding provider errors (query or candidate text)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Generation backend errors
    #[error("Generation error: {0}")]
    Generation(String),

    /// Generation did not finish within the per-request deadline
    #[error("Generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Whether the error was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::InvalidInput(_))
    }

    /// Whether a client may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::GenerationTimeout(_))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::InvalidInput("query must not be empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: query must not be empty");

        let err = AppError::GenerationTimeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Generation timed out after 30s");

        let err = AppError::GenerationTimeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Generation timed out after 250ms");
    }

    #[test]
    fn test_error_classification() {
        assert!(AppError::InvalidInput("x".into()).is_client_error());
        assert!(!AppError::Embedding("x".into()).is_client_error());
        assert!(AppError::GenerationTimeout(Duration::from_secs(1)).is_retryable());
        assert!(!AppError::Generation("x".into()).is_retryable());
    }

    #[test]
    fn test_from_serde_json() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
