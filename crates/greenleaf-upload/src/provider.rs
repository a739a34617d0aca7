//! The image host abstraction

use crate::error::ProviderError;

/// An image as received from the user
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// An external image host.
///
/// Higher `priority` is tried first.
#[async_trait::async_trait]
pub trait UploadProvider: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> u32;

    /// Store the file and return its public URL
    async fn upload(&self, file: &UploadFile) -> Result<String, ProviderError>;

    /// Lightweight reachability check
    async fn check_availability(&self) -> bool;
}

/// Turn a non-2xx response into an error, keeping at most 256 chars of body
pub(crate) async fn status_error(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(256)
        .collect();
    ProviderError::Status { status, body }
}
