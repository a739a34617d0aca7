use std::time::Duration;

use greenleaf_core::GreenLeafError;
use thiserror::Error;

/// Failure of a single provider call
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError::Storage(err.to_string())
    }
}

/// Rejection before any provider is contacted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("File is empty")]
    Empty,

    #[error("Only image files are allowed (got {0})")]
    UnsupportedType(String),

    #[error("File exceeds the {limit_mb} MB limit")]
    TooLarge { limit_mb: u64 },

    #[error("Upload configuration error: {0}")]
    Config(String),
}

impl From<UploadError> for GreenLeafError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Config(detail) => GreenLeafError::internal(detail),
            other => GreenLeafError::Validation(other.to_string()),
        }
    }
}
