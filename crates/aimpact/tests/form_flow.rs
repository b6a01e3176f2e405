//! Drives a headless form against a real server on a local port.

use std::sync::Arc;
use std::time::Duration;

use aimpact::crypto::{generate_key_fragment, ReportCipher};
use aimpact::form::{FormController, FormOptions, PipelineReportService, SUBMITTED_MESSAGE};
use aimpact::machine::{FormEvent, FormState};
use aimpact::reference::ReferenceStore;
use aimpact::report::{LoadedReport, ReportRow, ReportStatus, RowEdit, RowId, TeamInfo};
use aimpact::server::{create_router, AppState};
use aimpact::storage::{BlobId, BlobStore, RetentionPolicy};
use aimpact::submit::{HttpUploader, SubmissionMetadata, SubmitPipeline};
use tokio::net::TcpListener;

struct RunningServer {
    endpoint: String,
    blobs: Arc<BlobStore>,
    _dir: tempfile::TempDir,
}

async fn start_server() -> RunningServer {
    let dir = tempfile::tempdir().unwrap();
    let blobs = Arc::new(BlobStore::new(RetentionPolicy::default()));
    let state = AppState {
        blobs: blobs.clone(),
        reference: Arc::new(ReferenceStore::new(dir.path().join("reference-data.json"))),
        public_base_url: String::new(),
        max_upload_bytes: 1024 * 1024,
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    RunningServer {
        endpoint: format!("http://{addr}"),
        blobs,
        _dir: dir,
    }
}

fn loaded_report() -> LoadedReport {
    let mut row = ReportRow::new(RowId(1));
    row.platform = "Web".to_string();
    row.set_sdlc_step("Development".to_string());
    row.sdlc_task = "Coding".to_string();
    row.category = "Feature".to_string();
    row.complexity = "High".to_string();
    row.quality_impact = "Improved".to_string();
    row.estimated_hours_without_ai = Some(5.0);
    row.actual_hours_with_ai = Some(2.0);
    row.tools_used = vec!["Claude".to_string(), "Cursor".to_string()];

    LoadedReport {
        team: TeamInfo {
            name: "Checkout".to_string(),
            member: "Jo".to_string(),
            role: String::new(),
        },
        rows: vec![row],
        read_only: false,
    }
}

#[tokio::test]
async fn submit_through_server_and_decrypt() {
    let server = start_server().await;
    let fragment = generate_key_fragment();

    let uploader = HttpUploader::new(server.endpoint.clone(), Duration::from_secs(5)).unwrap();
    let service = Arc::new(PipelineReportService::new(
        SubmitPipeline::new(fragment.clone(), Arc::new(uploader.clone())),
        SubmissionMetadata {
            thread_id: "thread-1".to_string(),
            author_id: "author-1".to_string(),
        },
        loaded_report(),
    ));

    let options = FormOptions {
        redirect_delay: Duration::from_millis(50),
        ..FormOptions::default()
    };
    let handle = FormController::spawn(service.clone(), options);
    handle.send(FormEvent::Initialize).await.unwrap();
    handle.wait_for_state(FormState::Editing).await.unwrap();

    // The loaded report is missing the role, so submitting is refused.
    let step = handle.send(FormEvent::Submit).await.unwrap();
    assert!(!step.accepted);

    handle
        .send(FormEvent::UpdateTeamRole("Lead".to_string()))
        .await
        .unwrap();
    let step = handle
        .send(FormEvent::UpdateRow {
            id: RowId(1),
            edit: RowEdit::Notes("pairing with an assistant".to_string()),
        })
        .await
        .unwrap();
    assert!(step.accepted);

    let done = handle.finish(ReportStatus::Submitted).await.unwrap();
    assert_eq!(done.state, FormState::Success);
    assert_eq!(done.context.success_message.as_deref(), Some(SUBMITTED_MESSAGE));

    let redirected = handle
        .wait_for_state(FormState::Redirecting)
        .await
        .unwrap();
    assert_eq!(redirected.navigated_to.as_deref(), Some("/"));

    let receipt = service.last_receipt().await.unwrap();
    let id = BlobId::parse(&receipt.id).unwrap();
    assert_eq!(receipt.url, format!("/api/blobs/{id}"));

    let stored = server.blobs.get(&id).unwrap().unwrap();
    assert_eq!(stored.metadata.status, Some(ReportStatus::Submitted));
    assert_eq!(stored.metadata.author_id.as_deref(), Some("author-1"));

    let fetched = uploader.fetch(&id).await.unwrap().unwrap();
    assert_eq!(fetched, stored.bytes.to_vec());

    let cipher = ReportCipher::import(&fragment).unwrap();
    let payload: serde_json::Value =
        serde_json::from_slice(&cipher.decrypt_bytes(&fetched).unwrap()).unwrap();
    assert_eq!(payload["status"], "submitted");
    assert_eq!(payload["teamRole"], "Lead");
    assert_eq!(payload["rows"][0]["timeSaved"], "3.00");
    assert_eq!(payload["rows"][0]["toolsUsed"], "Claude, Cursor");
    assert_eq!(payload["rows"][0]["notes"], "pairing with an assistant");
}

#[tokio::test]
async fn unreachable_server_surfaces_generic_error_and_retry() {
    // Bind and drop a listener to get a port nothing is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut report = loaded_report();
    report.team.role = "Lead".to_string();

    let uploader = HttpUploader::new(endpoint, Duration::from_secs(2)).unwrap();
    let service = Arc::new(PipelineReportService::new(
        SubmitPipeline::new(generate_key_fragment(), Arc::new(uploader)),
        SubmissionMetadata::default(),
        report,
    ));

    let handle = FormController::spawn(service.clone(), FormOptions::default());
    let failed = handle.finish(ReportStatus::Draft).await.unwrap();
    assert_eq!(failed.state, FormState::Error);
    assert_eq!(
        failed.context.error.as_deref(),
        Some("Could not save draft. Please try again.")
    );
    assert!(service.last_receipt().await.is_none());

    let step = handle.send(FormEvent::Retry).await.unwrap();
    assert_eq!(step.to, FormState::Editing);
    let snapshot = handle.snapshot();
    assert!(snapshot.context.error.is_none());
    assert_eq!(snapshot.context.rows.len(), 1);
}
