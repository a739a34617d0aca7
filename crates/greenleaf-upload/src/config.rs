//! Upload configuration

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::error::UploadError;
use crate::imgbb::ImgbbProvider;
use crate::imgur::ImgurProvider;
use crate::provider::UploadProvider;
use crate::temporary::TemporaryStore;
use crate::uploader::{UploadLimits, Uploader};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub imgur_client_id: Option<String>,
    pub imgbb_api_key: Option<String>,

    /// Directory for the temporary fallback; `None` disables it
    pub temp_upload_dir: Option<PathBuf>,

    /// Server base URL, used to build temporary-upload links
    pub public_url: String,

    pub max_upload_mb: u64,
    pub allowed_mime_prefix: String,
    pub provider_timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            imgur_client_id: None,
            imgbb_api_key: None,
            temp_upload_dir: None,
            public_url: "http://localhost:8080".to_string(),
            max_upload_mb: 10,
            allowed_mime_prefix: "image/".to_string(),
            provider_timeout_secs: 10,
        }
    }
}

impl UploadConfig {
    pub fn limits(&self) -> UploadLimits {
        UploadLimits {
            max_bytes: self.max_upload_mb * 1024 * 1024,
            allowed_mime_prefix: self.allowed_mime_prefix.clone(),
        }
    }

    /// Build the provider chain from whichever credentials are present
    pub fn build_uploader(&self) -> Result<Uploader, UploadError> {
        let timeout = Duration::from_secs(self.provider_timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("greenleaf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UploadError::Config(e.to_string()))?;

        let mut providers: Vec<Arc<dyn UploadProvider>> = Vec::new();
        if let Some(id) = non_empty(&self.imgur_client_id) {
            providers.push(Arc::new(ImgurProvider::new(id, client.clone())));
        }
        if let Some(key) = non_empty(&self.imgbb_api_key) {
            providers.push(Arc::new(ImgbbProvider::new(key, client.clone())));
        }

        let mut uploader = Uploader::new(providers, self.limits(), timeout);

        if let Some(dir) = &self.temp_upload_dir {
            let base = Url::parse(&self.public_url)
                .and_then(|u| u.join("uploads/temporary/"))
                .map_err(|e| UploadError::Config(format!("invalid public url: {}", e)))?;
            uploader = uploader.with_temporary_store(TemporaryStore::new(dir, base));
        }

        if uploader.provider_names().is_empty() && !uploader.has_temporary_store() {
            warn!("No upload providers configured; every upload will fail");
        }

        Ok(uploader)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
