//! Test utilities for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use greenleaf_auth::{
    IdTokenVerifier, MailError, Mailer, PasswordHasher, Registration, ResetEmail,
};
use greenleaf_core::Role;
use greenleaf_server::config::ServerConfig;
use greenleaf_server::state::{AppState, Services};
use greenleaf_store::InMemoryCredentialStore;
use greenleaf_upload::{ProviderError, UploadFile, UploadLimits, UploadProvider, Uploader};
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-battery";

/// Records reset emails instead of sending them
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<ResetEmail>>,
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, email: &ResetEmail) -> Result<(), MailError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }
        Ok(())
    }
}

/// Upload provider that either always succeeds or always fails
pub struct FakeProvider {
    pub name: &'static str,
    pub priority: u32,
    pub works: bool,
}

#[async_trait::async_trait]
impl UploadProvider for FakeProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn upload(&self, file: &UploadFile) -> Result<String, ProviderError> {
        if self.works {
            Ok(format!("https://{}.example/{}", self.name, file.name))
        } else {
            Err(ProviderError::Status {
                status: 503,
                body: format!("{} unavailable", self.name),
            })
        }
    }

    async fn check_availability(&self) -> bool {
        self.works
    }
}

pub fn provider(name: &'static str, priority: u32, works: bool) -> Arc<dyn UploadProvider> {
    Arc::new(FakeProvider {
        name,
        priority,
        works,
    })
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        jwt_secret: "integration_test_secret_32_bytes".to_string(),
        public_url: "http://greenleaf.test".to_string(),
        ..Default::default()
    }
}

/// Test application wrapper
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    /// Local strategy, in-memory store, a failing "A" ahead of a working "B"
    pub async fn new() -> Self {
        Self::build(
            test_config(),
            vec![provider("A", 20, false), provider("B", 10, true)],
            None,
        )
    }

    pub fn build(
        config: ServerConfig,
        providers: Vec<Arc<dyn UploadProvider>>,
        verifier: Option<Arc<dyn IdTokenVerifier>>,
    ) -> Self {
        let uploader = Uploader::new(
            providers,
            UploadLimits {
                max_bytes: config.max_upload_mb * 1024 * 1024,
                allowed_mime_prefix: config.allowed_mime_prefix.clone(),
            },
            Duration::from_secs(2),
        );
        Self::with_uploader(config, uploader, verifier)
    }

    pub fn with_uploader(
        config: ServerConfig,
        uploader: Uploader,
        verifier: Option<Arc<dyn IdTokenVerifier>>,
    ) -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::from_services(
            config,
            Services {
                store: Arc::new(InMemoryCredentialStore::new()),
                mailer: mailer.clone(),
                hasher: PasswordHasher::low_cost(),
                uploader,
                verifier,
            },
        )
        .expect("valid test configuration");

        let router = greenleaf_server::create_router(state.clone());
        Self {
            router,
            state,
            mailer,
        }
    }

    /// Get the router for making requests
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, headers, json)
    }

    /// Create an account directly (any role) and return its session token
    pub async fn user_with_role(&self, email: &str, role: Role) -> String {
        self.state
            .accounts
            .register(Registration {
                name: "Test User".to_string(),
                email: email.to_string(),
                password: PASSWORD.to_string(),
                role,
                location: None,
            })
            .await
            .unwrap()
            .token
    }

    /// Wait for the background reset mail to arrive
    pub async fn next_reset_email(&self) -> ResetEmail {
        for _ in 0..100 {
            if let Some(email) = self.mailer.sent.lock().unwrap().pop() {
                return email;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("no reset email was sent");
    }

    pub fn sent_count(&self) -> usize {
        self.mailer.sent.lock().unwrap().len()
    }
}

pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn multipart_upload(token: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    const BOUNDARY: &str = "greenleaf-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}
