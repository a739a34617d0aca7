//! Local fallback storage used when every image host fails

use std::path::{Path, PathBuf};

use tracing::info;
use url::Url;

use crate::error::ProviderError;
use crate::provider::UploadFile;

pub const TEMPORARY_PROVIDER: &str = "temporary";

/// Writes files to a local directory and hands out URLs under the
/// server's temporary-upload route.
#[derive(Debug, Clone)]
pub struct TemporaryStore {
    dir: PathBuf,
    public_base: Url,
}

impl TemporaryStore {
    /// `public_base` is the URL prefix files are served from; a trailing
    /// slash is added when missing.
    pub fn new(dir: impl Into<PathBuf>, mut public_base: Url) -> Self {
        if !public_base.path().ends_with('/') {
            let path = format!("{}/", public_base.path());
            public_base.set_path(&path);
        }
        Self {
            dir: dir.into(),
            public_base,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn store(&self, file: &UploadFile) -> Result<String, ProviderError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let name = format!(
            "{}.{}",
            uuid::Uuid::new_v4().simple(),
            extension_for(&file.content_type)
        );
        tokio::fs::write(self.dir.join(&name), &file.bytes).await?;

        let url = self
            .public_base
            .join(&name)
            .map_err(|e| ProviderError::Storage(e.to_string()))?;
        info!(file = %file.name, stored_as = %name, "Stored upload in temporary storage");
        Ok(url.to_string())
    }
}

/// Extension for a stored file, from the declared image type only.
///
/// The client's file name never contributes; anything outside the list is
/// stored as `.img` so it cannot be served as markup or script.
fn extension_for(content_type: &str) -> &'static str {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        "image/heic" => "heic",
        "image/avif" => "avif",
        _ => "img",
    }
}
