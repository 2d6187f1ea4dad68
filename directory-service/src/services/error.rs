use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Unknown email or wrong password; the two are never distinguished.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Google sign-in rejected")]
    InvalidAssertion,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Google users cannot change their email")]
    FederatedEmailLocked,

    #[error("{0}")]
    Validation(String),

    #[error("Storage failure: {0}")]
    StorageFailure(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<mongodb::error::Error> for ServiceError {
    fn from(err: mongodb::error::Error) -> Self {
        ServiceError::StorageFailure(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::StorageFailure(anyhow::Error::new(err))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials
            | ServiceError::InvalidToken
            | ServiceError::InvalidAssertion => AppError::Unauthorized(anyhow::anyhow!(err.to_string())),
            ServiceError::Forbidden => AppError::Forbidden,
            ServiceError::NotFound(_) => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::FederatedEmailLocked | ServiceError::Validation(_) => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::StorageFailure(e) => AppError::StorageError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
