use std::sync::Arc;
use std::time::Duration;

use aimpact::crypto::{generate_key_fragment, ReportCipher};
use aimpact::report::{ReportFormContext, ReportStatus, RowId, TeamInfo};
use aimpact::storage::BlobId;
use aimpact::submit::{
    BlobUploader, HttpUploader, SubmissionMetadata, SubmitPipeline, UploadRequest,
};
use aimpact::Error;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn metadata() -> SubmissionMetadata {
    SubmissionMetadata {
        thread_id: "thread-42".to_string(),
        author_id: "author-7".to_string(),
    }
}

fn complete_context() -> ReportFormContext {
    let mut ctx = ReportFormContext::with_first_row(RowId(1_700_000_000_000));
    ctx.team = TeamInfo {
        name: "Search".to_string(),
        member: "Robin".to_string(),
        role: "Engineer".to_string(),
    };
    let row = &mut ctx.rows[0];
    row.estimated_hours_without_ai = Some(3.0);
    row.actual_hours_with_ai = Some(1.0);
    ctx
}

#[tokio::test]
async fn upload_sends_raw_body_and_metadata_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header("x-thread-id", "thread-42"))
        .and(header("x-author-id", "author-7"))
        .and(header("x-report-status", "submitted"))
        .and(header("content-type", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "id": "loyw3v28-abcdefghij",
            "url": "/api/blobs/loyw3v28-abcdefghij"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fragment = generate_key_fragment();
    let uploader = HttpUploader::new(server.uri(), Duration::from_secs(5)).unwrap();
    let pipeline = SubmitPipeline::new(fragment.clone(), Arc::new(uploader));

    let receipt = pipeline
        .run(&complete_context(), ReportStatus::Submitted, &metadata())
        .await
        .unwrap();
    assert_eq!(receipt.id, "loyw3v28-abcdefghij");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let cipher = ReportCipher::import(&fragment).unwrap();
    let plaintext = cipher.decrypt_bytes(&requests[0].body).unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&plaintext).unwrap();
    assert_eq!(payload["teamMember"], "Robin");
    assert_eq!(payload["rows"][0]["timeSaved"], "2.00");
}

#[tokio::test]
async fn upload_non_success_status_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let uploader = HttpUploader::new(server.uri(), Duration::from_secs(5)).unwrap();
    let err = uploader
        .upload(UploadRequest {
            body: vec![0u8; 32],
            metadata: metadata(),
            status: ReportStatus::Draft,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Transport {
            status: Some(500),
            ..
        }
    ));
}

#[tokio::test]
async fn upload_reported_failure_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "id": "",
            "url": ""
        })))
        .mount(&server)
        .await;

    let uploader = HttpUploader::new(server.uri(), Duration::from_secs(5)).unwrap();
    let err = uploader
        .upload(UploadRequest {
            body: vec![1u8; 32],
            metadata: metadata(),
            status: ReportStatus::Draft,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport { status: None, .. }));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let uploader = HttpUploader::new(server.uri(), Duration::from_millis(100)).unwrap();
    let err = uploader
        .upload(UploadRequest {
            body: vec![2u8; 32],
            metadata: metadata(),
            status: ReportStatus::Submitted,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
}

#[tokio::test]
async fn fetch_returns_bytes_or_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/blobs/abc-0123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8, 8, 7]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/blobs/abc-zzzzzzzzzz"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let uploader = HttpUploader::new(server.uri(), Duration::from_secs(5)).unwrap();

    let found = BlobId::parse("abc-0123456789").unwrap();
    assert_eq!(uploader.fetch(&found).await.unwrap(), Some(vec![9u8, 8, 7]));

    let missing = BlobId::parse("abc-zzzzzzzzzz").unwrap();
    assert_eq!(uploader.fetch(&missing).await.unwrap(), None);
}
