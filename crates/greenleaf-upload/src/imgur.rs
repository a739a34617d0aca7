//! Imgur anonymous image upload

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{status_error, UploadFile, UploadProvider};

pub const IMGUR_API_URL: &str = "https://api.imgur.com";

#[derive(Debug, Deserialize)]
struct ImgurResponse {
    #[serde(default)]
    success: bool,
    data: Option<ImgurImage>,
}

#[derive(Debug, Deserialize)]
struct ImgurImage {
    link: Option<String>,
}

pub struct ImgurProvider {
    client_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl ImgurProvider {
    pub fn new(client_id: impl Into<String>, client: reqwest::Client) -> Self {
        Self::with_base_url(client_id, IMGUR_API_URL, client)
    }

    pub fn with_base_url(
        client_id: impl Into<String>,
        base_url: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn authorization(&self) -> String {
        format!("Client-ID {}", self.client_id)
    }
}

#[async_trait::async_trait]
impl UploadProvider for ImgurProvider {
    fn name(&self) -> &str {
        "imgur"
    }

    fn priority(&self) -> u32 {
        100
    }

    async fn upload(&self, file: &UploadFile) -> Result<String, ProviderError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let form = Form::new().part("image", part).text("type", "file");

        let response = self
            .client
            .post(format!("{}/3/image", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: ImgurResponse = response.json().await?;
        match (body.success, body.data.and_then(|d| d.link)) {
            (true, Some(link)) => {
                debug!(url = %link, "Imgur accepted upload");
                Ok(link)
            }
            _ => Err(ProviderError::InvalidResponse("missing image link".into())),
        }
    }

    async fn check_availability(&self) -> bool {
        self.client
            .get(format!("{}/3/credits", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
