//! Authentication errors

use greenleaf_core::GreenLeafError;
use greenleaf_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    MissingCredential,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Unknown email or wrong password; callers never learn which
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Invalid or expired token")]
    InvalidOrExpired,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("{0}")]
    Unsupported(String),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Token signing error: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => AuthError::DuplicateEmail,
            StoreError::TokenUnavailable => AuthError::InvalidOrExpired,
            other => AuthError::Store(other),
        }
    }
}

impl From<GreenLeafError> for AuthError {
    fn from(err: GreenLeafError) -> Self {
        match err {
            GreenLeafError::Validation(msg) => AuthError::Validation(msg),
            other => AuthError::Validation(other.to_string()),
        }
    }
}

impl AuthError {
    /// Collapse into the public error kind
    pub fn kind(&self) -> GreenLeafError {
        match self {
            AuthError::Validation(msg) | AuthError::Unsupported(msg) => {
                GreenLeafError::Validation(msg.clone())
            }
            AuthError::DuplicateEmail => GreenLeafError::validation("Email already registered"),
            AuthError::MissingCredential => {
                GreenLeafError::Unauthenticated("Authentication required".into())
            }
            AuthError::InvalidToken(_) => {
                GreenLeafError::Unauthenticated("Invalid or expired session".into())
            }
            AuthError::InvalidCredentials => {
                GreenLeafError::Unauthenticated("Invalid email or password".into())
            }
            AuthError::UserNotFound => GreenLeafError::NotFound("User".into()),
            AuthError::Forbidden => GreenLeafError::Forbidden,
            AuthError::InvalidOrExpired => GreenLeafError::InvalidOrExpired,
            AuthError::Provider(detail)
            | AuthError::Hashing(detail)
            | AuthError::Signing(detail)
            | AuthError::Config(detail) => GreenLeafError::internal(detail.clone()),
            AuthError::Store(err) => GreenLeafError::internal(err.to_string()),
        }
    }
}
