use crate::config::ConfigError;
use club_ledger::LedgerError;
use club_roles::RoleDenial;
use club_storage::StorageError;
use club_types::ActivityId;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the application services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("activity {0} is full")]
    ActivityFull(ActivityId),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => ServiceError::NotFound(what),
            StorageError::Conflict(what) | StorageError::CapacityExceeded(what) => {
                ServiceError::Conflict(what)
            }
            StorageError::InvalidInput(what) => ServiceError::Validation(what),
            other => ServiceError::Unavailable(other.to_string()),
        }
    }
}

impl From<RoleDenial> for ServiceError {
    fn from(denial: RoleDenial) -> Self {
        ServiceError::Forbidden(denial.to_string())
    }
}
