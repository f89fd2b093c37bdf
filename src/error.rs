use std::time::Duration;

use thiserror::Error;

/// Main error type for the loyalty backend.
///
/// Use cases translate storage-level failures into the domain variants at
/// the top of the enum; nothing below the use-case boundary hands a
/// `sqlx::Error` or `reqwest::Error` to handlers or the worker.
#[derive(Error, Debug)]
pub enum GophermartError {
    // Domain errors
    #[error("already exists")]
    AlreadyExists,

    #[error("not found")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid order number")]
    InvalidOrderNumber,

    #[error("invalid amount")]
    InvalidAmount,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("invalid auth token")]
    InvalidToken,

    // Accrual client outcomes
    #[error("order not registered in accrual system")]
    OrderNotRegistered,

    #[error("accrual rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("accrual request failed: {0}")]
    Accrual(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    // Infrastructure errors
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("password hash error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for GophermartError.
pub type Result<T> = std::result::Result<T, GophermartError>;
