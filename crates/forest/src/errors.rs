//! Error types for forest inference and validation

use thiserror::Error;

/// Errors that can occur while validating or evaluating a forest
#[derive(Error, Debug)]
pub enum ForestError {
    /// Input vector has the wrong number of features
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    /// Model structure is invalid
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    /// A tree could not be evaluated (broken node links)
    #[error("tree {0} is malformed")]
    MalformedTree(usize),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for forest operations
pub type Result<T> = std::result::Result<T, ForestError>;
