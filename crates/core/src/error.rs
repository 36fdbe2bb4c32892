//! Error types for docqa.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, generation, retrieval, knowledge
//! lookup, and workflow orchestration.

use thiserror::Error;

/// Unified error type for docqa.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation port (LLM provider) errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Retriever port errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Knowledge-tool port errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Workflow orchestration errors
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
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
