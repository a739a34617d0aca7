//! Error kinds surfaced to Green Leaf clients

use thiserror::Error;

/// Public error kinds.
///
/// Every crate keeps its own detailed error type; at the edge those are
/// collapsed into one of these kinds, which decide the HTTP status and the
/// short message a client is allowed to see.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GreenLeafError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid or expired token")]
    InvalidOrExpired,

    #[error("Upload failed: {0}")]
    UpstreamProviderFailure(String),

    #[error("Internal server error")]
    Internal(String),
}

impl GreenLeafError {
    /// HTTP status code for this kind
    pub fn status_code(&self) -> u16 {
        match self {
            GreenLeafError::Validation(_) => 400,
            GreenLeafError::Unauthenticated(_) => 401,
            GreenLeafError::Forbidden => 403,
            GreenLeafError::NotFound(_) => 404,
            GreenLeafError::InvalidOrExpired => 400,
            GreenLeafError::UpstreamProviderFailure(_) => 502,
            GreenLeafError::Internal(_) => 500,
        }
    }

    /// Message that is safe to show to a client.
    ///
    /// Internal details never leave the server; `Display` of `Internal`
    /// already hides them, this only makes the intent explicit at call sites.
    pub fn public_message(&self) -> String {
        self.to_string()
    }

    pub fn validation(message: impl Into<String>) -> Self {
        GreenLeafError::Validation(message.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        GreenLeafError::Internal(detail.into())
    }
}

impl From<serde_json::Error> for GreenLeafError {
    fn from(err: serde_json::Error) -> Self {
        GreenLeafError::Validation(err.to_string())
    }
}
