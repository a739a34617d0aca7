//! Fallback across real provider clients against mocked hosts

use std::sync::Arc;
use std::time::Duration;

use greenleaf_upload::{
    ImgbbProvider, ImgurProvider, UploadFile, UploadLedger, UploadLimits, UploadProvider, Uploader,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn failing_imgur() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/3/image"))
        .respond_with(ResponseTemplate::new(500).set_body_string("over capacity"))
        .expect(1)
        .mount(&server)
        .await;
    server
}

async fn working_imgbb() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "status": 200,
            "data": { "url": "https://i.ibb.co/xyz/leaf.png" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    server
}

fn chain(imgur: &MockServer, imgbb: &MockServer) -> Uploader {
    let client = reqwest::Client::new();
    let providers: Vec<Arc<dyn UploadProvider>> = vec![
        Arc::new(ImgbbProvider::with_base_url("key", imgbb.uri(), client.clone())),
        Arc::new(ImgurProvider::with_base_url("id", imgur.uri(), client)),
    ];
    Uploader::new(providers, UploadLimits::default(), Duration::from_secs(5))
}

#[tokio::test]
async fn test_imgur_failure_falls_back_to_imgbb_and_ledger_records_it() {
    let imgur = failing_imgur().await;
    let imgbb = working_imgbb().await;
    let uploader = chain(&imgur, &imgbb);
    let mut ledger = UploadLedger::new();

    let file = UploadFile::new("cassava-leaf.png", "image/png", vec![0x89, b'P', b'N', b'G']);
    let result = uploader.upload(&file).await.unwrap();
    ledger.add_upload(&file.name, file.size(), &result);

    assert!(result.success);
    assert_eq!(result.provider.as_deref(), Some("imgbb"));

    let entry = ledger.entries().next().unwrap();
    assert_eq!(entry.provider.as_deref(), Some("imgbb"));
    assert_eq!(entry.url.as_deref(), Some("https://i.ibb.co/xyz/leaf.png"));
    assert_eq!(ledger.stats().success_rate, 100);
}

#[tokio::test]
async fn test_oversized_file_never_reaches_hosts() {
    let imgur = MockServer::start().await;
    let imgbb = MockServer::start().await;
    let uploader = chain(&imgur, &imgbb);

    let file = UploadFile::new("huge.png", "image/png", vec![0u8; 15 * 1024 * 1024]);
    assert!(uploader.upload(&file).await.is_err());

    assert!(imgur.received_requests().await.unwrap().is_empty());
    assert!(imgbb.received_requests().await.unwrap().is_empty());
}
