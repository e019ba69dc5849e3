use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("user not found: {id}")]
    NotFound { id: Uuid },

    #[error("email already registered")]
    EmailTaken,

    #[error("user {id} was modified concurrently")]
    Conflict { id: Uuid },

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<validator::ValidationErrors> for AccountError {
    fn from(e: validator::ValidationErrors) -> Self {
        AccountError::Validation(e.to_string())
    }
}

pub type AccountResult<T> = Result<T, AccountError>;
