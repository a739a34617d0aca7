//! Provider fallback chain

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use greenleaf_core::{ProviderStatus, UploadResult};
use tracing::{error, info, warn};

use crate::error::{ProviderError, UploadError};
use crate::provider::{UploadFile, UploadProvider};
use crate::temporary::{TemporaryStore, TEMPORARY_PROVIDER};

pub const ALL_FAILED: &str = "All upload providers failed";
pub const NONE_CONFIGURED: &str = "No upload providers configured";

/// What a file must satisfy before any provider sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_bytes: u64,
    pub allowed_mime_prefix: String,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            allowed_mime_prefix: "image/".to_string(),
        }
    }
}

/// Tries each provider in descending priority until one accepts the file.
///
/// Each call is bounded by `timeout`; a timeout counts as a failure and
/// moves on to the next provider. If all of them fail and a temporary
/// store is configured, the file is kept there instead.
pub struct Uploader {
    providers: Vec<Arc<dyn UploadProvider>>,
    temporary: Option<TemporaryStore>,
    limits: UploadLimits,
    timeout: Duration,
}

impl Uploader {
    pub fn new(
        mut providers: Vec<Arc<dyn UploadProvider>>,
        mut limits: UploadLimits,
        timeout: Duration,
    ) -> Self {
        // Compared against lower-cased content types
        limits.allowed_mime_prefix = limits.allowed_mime_prefix.trim().to_ascii_lowercase();

        // Stable sort keeps registration order among equal priorities
        providers.sort_by_key(|p| std::cmp::Reverse(p.priority()));
        Self {
            providers,
            temporary: None,
            limits,
            timeout,
        }
    }

    pub fn with_temporary_store(mut self, store: TemporaryStore) -> Self {
        self.temporary = Some(store);
        self
    }

    pub fn temporary_store(&self) -> Option<&TemporaryStore> {
        self.temporary.as_ref()
    }

    pub fn has_temporary_store(&self) -> bool {
        self.temporary.is_some()
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Provider names in the order they are tried
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn validate(&self, file: &UploadFile) -> Result<(), UploadError> {
        if file.bytes.is_empty() {
            return Err(UploadError::Empty);
        }

        let content_type = file.content_type.trim().to_ascii_lowercase();
        if !content_type.starts_with(&self.limits.allowed_mime_prefix) {
            return Err(UploadError::UnsupportedType(file.content_type.clone()));
        }

        if file.size() > self.limits.max_bytes {
            return Err(UploadError::TooLarge {
                limit_mb: self.limits.max_bytes / (1024 * 1024),
            });
        }

        Ok(())
    }

    /// Push one file through the chain.
    ///
    /// `Err` only for files rejected by validation, in which case no
    /// provider was contacted. Provider failures come back as an
    /// `UploadResult` with `success: false`.
    pub async fn upload(&self, file: &UploadFile) -> Result<UploadResult, UploadError> {
        self.validate(file)?;

        let mut last_provider: Option<String> = None;
        let mut last_error: Option<ProviderError> = None;

        for provider in &self.providers {
            let outcome = tokio::time::timeout(self.timeout, provider.upload(file))
                .await
                .unwrap_or(Err(ProviderError::Timeout(self.timeout)));

            match outcome {
                Ok(url) => {
                    info!(provider = provider.name(), file = %file.name, "Upload succeeded");
                    return Ok(UploadResult::hosted(provider.name(), url));
                }
                Err(e) => {
                    warn!(provider = provider.name(), file = %file.name, error = %e, "Upload provider failed, trying next");
                    last_provider = Some(provider.name().to_string());
                    last_error = Some(e);
                }
            }
        }

        if let Some(store) = &self.temporary {
            match store.store(file).await {
                Ok(url) => {
                    warn!(file = %file.name, "All upload providers failed, kept file in temporary storage");
                    return Ok(UploadResult::temporary(TEMPORARY_PROVIDER, url));
                }
                Err(e) => {
                    error!(file = %file.name, error = %e, "Temporary storage failed");
                    last_provider = Some(TEMPORARY_PROVIDER.to_string());
                    last_error = Some(e);
                }
            }
        }

        // Provider detail stays in the log; callers only see the summary
        let message = match last_error {
            Some(e) => {
                error!(file = %file.name, provider = ?last_provider, error = %e, "All upload providers failed");
                ALL_FAILED
            }
            None => {
                error!(file = %file.name, "No upload providers configured");
                NONE_CONFIGURED
            }
        };
        Ok(UploadResult::failed(last_provider, message))
    }

    /// Check every provider at once; never touches upload state
    pub async fn provider_status(&self) -> Vec<ProviderStatus> {
        let checks = self.providers.iter().map(|provider| async move {
            let available = tokio::time::timeout(self.timeout, provider.check_availability())
                .await
                .unwrap_or(false);
            ProviderStatus {
                provider: provider.name().to_string(),
                available,
            }
        });
        let mut statuses = join_all(checks).await;

        if let Some(store) = &self.temporary {
            statuses.push(ProviderStatus {
                provider: TEMPORARY_PROVIDER.to_string(),
                available: tokio::fs::create_dir_all(store.dir()).await.is_ok(),
            });
        }

        statuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Succeed(&'static str),
        Fail,
        Hang,
    }

    struct FakeProvider {
        name: &'static str,
        priority: u32,
        behaviour: Behaviour,
        available: bool,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(name: &'static str, priority: u32, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                name,
                priority,
                behaviour,
                available: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl UploadProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> u32 {
            self.priority
        }

        async fn upload(&self, _file: &UploadFile) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Succeed(url) => Ok(url.to_string()),
                Behaviour::Fail => Err(ProviderError::Status {
                    status: 503,
                    body: format!("{} is down", self.name),
                }),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("never".to_string())
                }
            }
        }

        async fn check_availability(&self) -> bool {
            self.available
        }
    }

    fn uploader(providers: Vec<Arc<FakeProvider>>) -> Uploader {
        let providers = providers
            .into_iter()
            .map(|p| p as Arc<dyn UploadProvider>)
            .collect();
        Uploader::new(providers, UploadLimits::default(), Duration::from_millis(200))
    }

    fn png(size: usize) -> UploadFile {
        UploadFile::new("leaf.png", "image/png", vec![7u8; size])
    }

    #[tokio::test]
    async fn test_oversized_file_contacts_no_provider() {
        let a = FakeProvider::new("A", 10, Behaviour::Succeed("https://a/1"));
        let chain = uploader(vec![a.clone()]);

        let err = chain.upload(&png(15 * 1024 * 1024)).await.unwrap_err();
        assert_eq!(err, UploadError::TooLarge { limit_mb: 10 });
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_image_rejected() {
        let a = FakeProvider::new("A", 10, Behaviour::Succeed("https://a/1"));
        let chain = uploader(vec![a.clone()]);

        let file = UploadFile::new("notes.pdf", "application/pdf", vec![1, 2, 3]);
        assert!(matches!(chain.upload(&file).await, Err(UploadError::UnsupportedType(_))));
        assert!(matches!(chain.upload(&png(0)).await, Err(UploadError::Empty)));
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_mime_prefix_is_case_insensitive() {
        let a = FakeProvider::new("A", 10, Behaviour::Succeed("https://a/1"));
        let limits = UploadLimits {
            allowed_mime_prefix: " Image/".to_string(),
            ..UploadLimits::default()
        };
        let chain = Uploader::new(
            vec![a.clone() as Arc<dyn UploadProvider>],
            limits,
            Duration::from_millis(200),
        );
        assert_eq!(chain.limits().allowed_mime_prefix, "image/");

        let file = UploadFile::new("leaf.PNG", "IMAGE/PNG", vec![1, 2, 3]);
        assert!(chain.upload(&file).await.unwrap().success);
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_next_provider() {
        let a = FakeProvider::new("A", 20, Behaviour::Fail);
        let b = FakeProvider::new("B", 10, Behaviour::Succeed("https://b/leaf.png"));
        let c = FakeProvider::new("C", 5, Behaviour::Succeed("https://c/leaf.png"));
        let chain = uploader(vec![c.clone(), b.clone(), a.clone()]);

        let result = chain.upload(&png(1024)).await.unwrap();
        assert!(result.success);
        assert_eq!(result.provider.as_deref(), Some("B"));
        assert_eq!(result.url.as_deref(), Some("https://b/leaf.png"));
        assert!(!result.is_temporary);
        assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_hanging_provider_times_out() {
        let slow = FakeProvider::new("slow", 20, Behaviour::Hang);
        let fast = FakeProvider::new("fast", 10, Behaviour::Succeed("https://fast/1"));
        let chain = uploader(vec![slow, fast]);

        let result = chain.upload(&png(10)).await.unwrap();
        assert_eq!(result.provider.as_deref(), Some("fast"));
    }

    #[tokio::test]
    async fn test_all_failed_hides_provider_detail() {
        let a = FakeProvider::new("A", 20, Behaviour::Fail);
        let b = FakeProvider::new("B", 10, Behaviour::Fail);
        let chain = uploader(vec![a, b]);

        let result = chain.upload(&png(10)).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.provider.as_deref(), Some("B"));
        assert_eq!(result.error.as_deref(), Some(ALL_FAILED));
    }

    #[tokio::test]
    async fn test_degraded_to_temporary_store() {
        let dir = tempfile::tempdir().unwrap();
        let a = FakeProvider::new("A", 20, Behaviour::Fail);
        let chain = uploader(vec![a]).with_temporary_store(TemporaryStore::new(
            dir.path(),
            url::Url::parse("http://localhost:8080/uploads/temporary/").unwrap(),
        ));

        let result = chain.upload(&png(10)).await.unwrap();
        assert!(result.success);
        assert!(result.is_temporary);
        assert_eq!(result.provider.as_deref(), Some(TEMPORARY_PROVIDER));
    }

    #[tokio::test]
    async fn test_repeat_uploads_are_independent() {
        let a = FakeProvider::new("A", 10, Behaviour::Succeed("https://a/1"));
        let chain = uploader(vec![a.clone()]);
        let file = png(10);

        chain.upload(&file).await.unwrap();
        chain.upload(&file).await.unwrap();
        assert_eq!(a.calls(), 2);
    }

    #[tokio::test]
    async fn test_provider_status_checks_all() {
        let up = FakeProvider::new("up", 10, Behaviour::Fail);
        let down = Arc::new(FakeProvider {
            name: "down",
            priority: 5,
            behaviour: Behaviour::Fail,
            available: false,
            calls: AtomicUsize::new(0),
        });
        let chain = uploader(vec![up.clone(), down.clone()]);

        let statuses = chain.provider_status().await;
        assert_eq!(
            statuses,
            vec![
                ProviderStatus { provider: "up".into(), available: true },
                ProviderStatus { provider: "down".into(), available: false },
            ]
        );
        assert_eq!(up.calls() + down.calls(), 0);
    }
}
