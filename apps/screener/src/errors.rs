use thiserror::Error;

use crate::artifacts::{ArtifactKey, StoreError};

/// Fatal outcomes of a single stage invocation.
///
/// A write conflict is deliberately absent: losing a `put` race is reported as
/// `StageOutcome::Skipped`, never as an error.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Required input not found: {key}")]
    MissingInput { key: ArtifactKey },

    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    #[error("Schema violation in {subject}: {detail}")]
    SchemaViolation { subject: String, detail: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl StageError {
    pub fn schema(subject: impl Into<String>, detail: impl Into<String>) -> Self {
        StageError::SchemaViolation {
            subject: subject.into(),
            detail: detail.into(),
        }
    }

    /// Stable machine-readable code, logged alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            StageError::MissingInput { .. } => "MISSING_INPUT",
            StageError::InferenceFailure(_) => "INFERENCE_FAILURE",
            StageError::SchemaViolation { .. } => "SCHEMA_VIOLATION",
            StageError::Storage(_) => "STORAGE_ERROR",
        }
    }
}
