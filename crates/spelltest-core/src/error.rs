//! Engine error types.
//!
//! Every failure is returned to the immediate caller. The engine never
//! retries, so callers classify with [`EngineError::is_caller_error`] instead
//! of matching on message text.

use thiserror::Error;

/// Errors produced by the assessment engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced entity (test, slot, question) does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Policy or ownership violation, e.g. a student not subscribed to the module.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The test or slot is in the wrong lifecycle phase for the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed or shape-mismatched input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The question type has no scoring policy.
    #[error("unsupported question type: {0}")]
    UnsupportedQuestionType(String),

    /// The persistence collaborator failed.
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl EngineError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns `true` if re-issuing a corrected request can succeed, i.e. the
    /// failure is not a storage fault.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, EngineError::Storage(_))
    }
}

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;
