//! Error types for the triage module.

use crate::domain::error::ValidationError;

/// Errors produced while building a review queue.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriageError {
    #[error("invalid triage policy: {0}")]
    Configuration(String),

    #[error("invalid run data: {0}")]
    DataValidation(#[from] ValidationError),
}

/// Result type for triage operations.
pub type TriageResult<T> = std::result::Result<T, TriageError>;
