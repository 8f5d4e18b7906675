//! Service-layer error taxonomy.

use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Absent, or present but hidden from the caller. The two are never distinguished.
    #[error("{0} not found or insufficient permissions")]
    NotFoundOrForbidden(&'static str),
    /// A record the caller may see does not exist
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    /// Visible to the caller, but the operation is not theirs to perform
    #[error("{0}")]
    Forbidden(String),
    /// ORCID or another outbound dependency failed
    #[error("Upstream service error: {0}")]
    Upstream(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    pub fn missing_field(field: &str) -> Self {
        ServiceError::Validation(format!("Missing required field: {}", field))
    }

    /// Storage conflicts surface to callers as validation failures.
    pub fn from_conflict(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(message) => ServiceError::Validation(message),
            other => ServiceError::Storage(other),
        }
    }
}
