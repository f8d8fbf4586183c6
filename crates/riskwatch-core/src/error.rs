//! Core domain errors.

use thiserror::Error;

/// Core domain errors for RiskWatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Request failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Step identifier is not part of the pipeline.
    #[error("Unknown step: {0}")]
    UnknownStep(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
