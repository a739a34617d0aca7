//! ImgBB image upload

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{status_error, UploadFile, UploadProvider};

pub const IMGBB_API_URL: &str = "https://api.imgbb.com";

#[derive(Debug, Deserialize)]
struct ImgbbResponse {
    #[serde(default)]
    success: bool,
    data: Option<ImgbbImage>,
}

#[derive(Debug, Deserialize)]
struct ImgbbImage {
    url: Option<String>,
}

pub struct ImgbbProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl ImgbbProvider {
    pub fn new(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self::with_base_url(api_key, IMGBB_API_URL, client)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl UploadProvider for ImgbbProvider {
    fn name(&self) -> &str {
        "imgbb"
    }

    fn priority(&self) -> u32 {
        50
    }

    async fn upload(&self, file: &UploadFile) -> Result<String, ProviderError> {
        let encoded = STANDARD.encode(&file.bytes);
        let response = self
            .client
            .post(format!("{}/1/upload", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .form(&[("image", encoded.as_str()), ("name", file.name.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: ImgbbResponse = response.json().await?;
        match (body.success, body.data.and_then(|d| d.url)) {
            (true, Some(url)) => {
                debug!(url = %url, "ImgBB accepted upload");
                Ok(url)
            }
            _ => Err(ProviderError::InvalidResponse("missing image url".into())),
        }
    }

    async fn check_availability(&self) -> bool {
        // Any answer short of a server error means the host is up
        self.client
            .get(&self.base_url)
            .send()
            .await
            .map(|r| !r.status().is_server_error())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_upload_sends_key_and_base64() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/upload"))
            .and(query_param("key", "secret"))
            .and(body_string_contains("image=AQID"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "status": 200,
                "data": { "url": "https://i.ibb.co/abc/leaf.png" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ImgbbProvider::with_base_url("secret", server.uri(), reqwest::Client::new());
        let file = UploadFile::new("leaf.png", "image/png", vec![1, 2, 3]);
        assert_eq!(provider.upload(&file).await.unwrap(), "https://i.ibb.co/abc/leaf.png");
    }

    #[tokio::test]
    async fn test_unsuccessful_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "status": 400
            })))
            .mount(&server)
            .await;

        let provider = ImgbbProvider::with_base_url("secret", server.uri(), reqwest::Client::new());
        let file = UploadFile::new("leaf.png", "image/png", vec![1, 2, 3]);
        assert!(matches!(
            provider.upload(&file).await,
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
