use thiserror::Error;

use aula_core::CoreError;
use aula_db::DbError;
use aula_store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// Remote storage is missing or unreachable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Server-side state the caller cannot fix.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => ServiceError::NotFound(msg),
            DbError::Conflict(msg) => ServiceError::Conflict(msg),
            DbError::ForeignKey(msg) => {
                ServiceError::Conflict(format!("still referenced or dangling reference: {msg}"))
            }
            DbError::Constraint(msg) => ServiceError::Validation(msg),
            DbError::Internal(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidInput(msg) => ServiceError::Validation(msg),
            CoreError::UnsupportedFileType(msg) => ServiceError::Validation(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => ServiceError::NotFound(msg),
            StoreError::InvalidKey(msg) => ServiceError::NotFound(msg),
            StoreError::NotConfigured(msg) => ServiceError::Unavailable(msg),
            StoreError::Internal(msg) => {
                ServiceError::Unavailable(format!("remote storage: {msg}"))
            }
        }
    }
}
