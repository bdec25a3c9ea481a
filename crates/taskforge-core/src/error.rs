//! Typed outcomes for the kernel's public contract.
//!
//! The core never panics across a public operation boundary except on
//! programmer error. Conflicting concurrent writers are resolved internally
//! by the [`Store`](crate::store::Store)'s single-writer serialization and
//! never surface as a `CoreError` variant.

use skreaver_core::IdValidationError;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<IdValidationError> for CoreError {
    fn from(err: IdValidationError) -> Self {
        CoreError::Validation(err.to_string())
    }
}
