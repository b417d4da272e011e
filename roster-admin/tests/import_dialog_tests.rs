//! Import dialog behavior against an in-memory API
//!
//! Timer-dependent tests run on tokio's paused clock.

use async_trait::async_trait;
use roster_admin::api::{BulkReply, RecordApi, UploadFile};
use roster_admin::import::{DialogState, FailureKind, ImportDialog, ImportMode};
use roster_admin::page::RecordPage;
use roster_admin::{AdminError, AdminResult};
use roster_common::config::ImportSettings;
use roster_common::models::{BulkError, BulkResponse, ContactDraft, DeleteAllResponse};
use roster_common::{Contact, ResourceKind};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

type Responder = Box<dyn Fn() -> AdminResult<BulkReply> + Send + Sync>;

struct FakeApi {
    respond: Responder,
    latency: Duration,
    bulk_calls: AtomicUsize,
    list_calls: AtomicUsize,
    uploaded: Mutex<Vec<UploadFile>>,
    records: Mutex<Vec<Contact>>,
}

impl FakeApi {
    fn new(respond: impl Fn() -> AdminResult<BulkReply> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            latency: Duration::ZERO,
            bulk_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            uploaded: Mutex::new(Vec::new()),
            records: Mutex::new(Vec::new()),
        }
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    async fn reply(&self) -> AdminResult<BulkReply> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        (self.respond)()
    }
}

#[async_trait]
impl RecordApi<Contact> for FakeApi {
    async fn list(&self) -> AdminResult<Vec<Contact>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create(&self, _draft: &ContactDraft) -> AdminResult<Option<Contact>> {
        Ok(None)
    }

    async fn update(&self, _id: &str, _draft: &ContactDraft) -> AdminResult<Option<Contact>> {
        Ok(None)
    }

    async fn delete(&self, _id: &str) -> AdminResult<()> {
        Ok(())
    }

    async fn delete_all(&self) -> AdminResult<DeleteAllResponse> {
        Ok(DeleteAllResponse::default())
    }

    async fn bulk_create(&self, _rows: &[Value], _replace_all: bool) -> AdminResult<BulkReply> {
        self.reply().await
    }

    async fn bulk_upload(&self, file: UploadFile, _replace_all: bool) -> AdminResult<BulkReply> {
        self.uploaded.lock().unwrap().push(file);
        self.reply().await
    }
}

fn success(created: u64) -> AdminResult<BulkReply> {
    Ok(BulkReply {
        partial_content: false,
        response: BulkResponse {
            success: true,
            message: format!("Created {} contacts", created),
            created,
            ..Default::default()
        },
    })
}

fn with_row_errors(created: u64, failed: u64) -> AdminResult<BulkReply> {
    Ok(BulkReply {
        partial_content: false,
        response: BulkResponse {
            success: true,
            message: "Bulk create completed with errors".to_string(),
            created,
            errors: (1..=failed)
                .map(|row| BulkError {
                    row,
                    error: "Invalid phone number format".to_string(),
                    error_type: Some("validation".to_string()),
                    field: Some("phone".to_string()),
                })
                .collect(),
            has_errors: true,
            ..Default::default()
        },
    })
}

fn dialog(api: Arc<FakeApi>) -> (ImportDialog<Contact>, mpsc::UnboundedReceiver<ResourceKind>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ImportDialog::new(api, ImportSettings::default(), tx), rx)
}

fn rows(n: usize) -> String {
    let items: Vec<String> = (0..n)
        .map(|i| format!(r#"{{"name":"Person {}","phone":"{}"}}"#, i, 1000 + i))
        .collect();
    format!("[{}]", items.join(","))
}

fn csv_file(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, "name,phone\nAsha,123\n").unwrap();
    path
}

fn failure(state: &DialogState) -> (FailureKind, String) {
    match state {
        DialogState::Failed(f) => (f.kind, f.message.clone()),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_75_row_errors_show_50_and_notice() {
    let api = Arc::new(FakeApi::new(|| with_row_errors(25, 75)));
    let (dialog, _rx) = dialog(api);

    let state = dialog.submit_json(&rows(100), false).await;
    assert!(matches!(state, DialogState::PartialSuccess(_)));

    let view = dialog.report_view().unwrap();
    assert_eq!(view.lines.len(), 50);
    assert_eq!(view.lines[49], "Row 50: Invalid phone number format");
    assert_eq!(view.truncation_notice().as_deref(), Some("... and 25 more errors"));
}

#[tokio::test(start_paused = true)]
async fn test_success_auto_closes_after_exact_delay() {
    let api = Arc::new(FakeApi::new(|| success(3)));
    let (dialog, mut rx) = dialog(api);

    let state = dialog.submit_json(&rows(3), false).await;
    assert!(matches!(state, DialogState::Success(_)));

    tokio::time::sleep(Duration::from_millis(1999)).await;
    assert!(matches!(dialog.state(), DialogState::Success(_)));
    assert!(rx.try_recv().is_err());

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(dialog.state(), DialogState::Closed);
    assert_eq!(rx.try_recv().unwrap(), ResourceKind::Contacts);
}

#[tokio::test(start_paused = true)]
async fn test_clean_partial_upload_auto_closes() {
    let dir = TempDir::new().unwrap();
    let path = csv_file(&dir, "staff.csv");
    let api = Arc::new(FakeApi::new(|| {
        Ok(BulkReply {
            partial_content: true,
            response: BulkResponse {
                success: true,
                message: "Connection lost during upload".to_string(),
                created: 5,
                ..Default::default()
            },
        })
    }));
    let (dialog, mut rx) = dialog(api);

    match dialog.submit_file(Some(&path), false).await {
        DialogState::Success(report) => {
            assert!(report.incomplete);
            assert_eq!(report.created, 5);
        }
        other => panic!("unexpected state {:?}", other),
    }

    tokio::time::sleep(Duration::from_millis(1999)).await;
    assert!(matches!(dialog.state(), DialogState::Success(_)));

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(dialog.state(), DialogState::Closed);
    assert_eq!(rx.try_recv().unwrap(), ResourceKind::Contacts);
}

#[tokio::test]
async fn test_oversized_batch_rejected_without_request() {
    let api = Arc::new(FakeApi::new(|| success(0)));
    let (dialog, _rx) = dialog(api.clone());

    let state = dialog.submit_json(&rows(1001), false).await;
    let (kind, message) = failure(&state);
    assert_eq!(kind, FailureKind::Validation);
    assert_eq!(message, "Maximum 1000 contacts allowed per request");
    assert_eq!(api.bulk_calls(), 0);

    let state = dialog.submit_json(&rows(1000), false).await;
    assert!(matches!(state, DialogState::Success(_)));
    assert_eq!(api.bulk_calls(), 1);
}

#[tokio::test]
async fn test_empty_and_malformed_rejected_without_request() {
    let api = Arc::new(FakeApi::new(|| success(0)));
    let (dialog, _rx) = dialog(api.clone());

    let (_, message) = failure(&dialog.submit_json("[]", false).await);
    assert_eq!(message, "Contacts array cannot be empty");

    let (_, message) = failure(&dialog.submit_json("[{", false).await);
    assert_eq!(message, "Invalid JSON format");

    let (_, message) = failure(&dialog.submit_json(r#"{"name":"A"}"#, false).await);
    assert_eq!(message, "JSON must be an array of contacts");

    assert_eq!(api.bulk_calls(), 0);
}

#[tokio::test]
async fn test_file_extension_checked_before_upload() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(FakeApi::new(|| success(1)));
    let (dialog, _rx) = dialog(api.clone());

    let state = dialog.submit_file(Some(&csv_file(&dir, "notes.txt")), false).await;
    let (kind, message) = failure(&state);
    assert_eq!(kind, FailureKind::Validation);
    assert_eq!(message, "Only CSV and Excel files (.csv, .xlsx, .xls) are allowed");
    assert_eq!(api.bulk_calls(), 0);

    let (_, message) = failure(&dialog.submit_file(None, false).await);
    assert_eq!(message, "Please select a file");

    let state = dialog.submit_file(Some(&csv_file(&dir, "Staff.XLSX")), false).await;
    assert!(matches!(state, DialogState::Success(_)));

    let uploaded = api.uploaded.lock().unwrap();
    assert_eq!(uploaded[0].file_name, "Staff.XLSX");
    assert_eq!(
        uploaded[0].mime_type,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
}

#[tokio::test(start_paused = true)]
async fn test_second_submit_while_submitting_is_ignored() {
    let api = Arc::new(FakeApi::new(|| success(2)).with_latency(Duration::from_millis(500)));
    let (dialog, _rx) = dialog(api.clone());

    let first = {
        let dialog = dialog.clone();
        tokio::spawn(async move { dialog.submit_json(&rows(2), false).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(dialog.state(), DialogState::Submitting { mode: ImportMode::Json });

    let second = dialog.submit_json(&rows(2), false).await;
    assert_eq!(second, DialogState::Submitting { mode: ImportMode::Json });

    assert!(matches!(first.await.unwrap(), DialogState::Success(_)));
    assert_eq!(api.bulk_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_close_refused_during_upload_but_allowed_during_json() {
    let dir = TempDir::new().unwrap();
    let path = csv_file(&dir, "staff.csv");
    let api = Arc::new(FakeApi::new(|| success(4)).with_latency(Duration::from_millis(500)));

    let (upload_dialog, _rx) = dialog(api.clone());
    let upload = {
        let dialog = upload_dialog.clone();
        tokio::spawn(async move { dialog.submit_file(Some(&path), false).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!upload_dialog.request_close());
    assert_eq!(upload_dialog.state(), DialogState::Submitting { mode: ImportMode::File });
    upload.await.unwrap();

    let (json_dialog, mut rx) = dialog(api);
    let submit = {
        let dialog = json_dialog.clone();
        tokio::spawn(async move { dialog.submit_json(&rows(4), false).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(json_dialog.request_close());
    assert_eq!(json_dialog.state(), DialogState::Closed);

    // The late response leaves the dialog closed but still refreshes the list
    assert_eq!(submit.await.unwrap(), DialogState::Closed);
    assert_eq!(rx.try_recv().unwrap(), ResourceKind::Contacts);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_upload_discards_response() {
    let dir = TempDir::new().unwrap();
    let path = csv_file(&dir, "staff.csv");
    let api = Arc::new(FakeApi::new(|| success(0)).with_latency(Duration::from_millis(500)));
    let (dialog, mut rx) = dialog(api);

    let upload = {
        let dialog = dialog.clone();
        tokio::spawn(async move { dialog.submit_file(Some(&path), true).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(dialog.cancel_upload());

    let (kind, message) = failure(&dialog.state());
    assert_eq!(kind, FailureKind::Cancelled);
    assert_eq!(message, "Upload cancelled by user");

    upload.await.unwrap();
    assert_eq!(failure(&dialog.state()).0, FailureKind::Cancelled);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_transport_error_becomes_failure() {
    let api = Arc::new(FakeApi::new(|| {
        Err(AdminError::Api {
            status: reqwest::StatusCode::BAD_GATEWAY,
            message: "HTTP error! status: 502".to_string(),
        })
    }));
    let (dialog, _rx) = dialog(api);

    let (kind, message) = failure(&dialog.submit_json(&rows(1), false).await);
    assert_eq!(kind, FailureKind::Transport);
    assert_eq!(message, "HTTP error! status: 502");
}

#[tokio::test]
async fn test_partial_success_requires_dismissal() {
    let api = Arc::new(FakeApi::new(|| with_row_errors(1, 1)));
    let (dialog, mut rx) = dialog(api.clone());

    let state = dialog.submit_json(&rows(2), false).await;
    assert!(matches!(state, DialogState::PartialSuccess(_)));
    assert_eq!(rx.try_recv().unwrap(), ResourceKind::Contacts);

    // Result view must be dismissed before another submission
    let ignored = dialog.submit_json(&rows(2), false).await;
    assert!(matches!(ignored, DialogState::PartialSuccess(_)));
    assert_eq!(api.bulk_calls(), 1);

    assert!(dialog.dismiss());
    assert_eq!(dialog.state(), DialogState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_cancels_auto_close() {
    let api = Arc::new(FakeApi::new(|| success(1)));
    let (dialog, mut rx) = dialog(api);

    dialog.submit_json(&rows(1), false).await;
    dialog.teardown();

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert!(matches!(dialog.state(), DialogState::Success(_)));
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_page_reloads_after_auto_close() {
    let api = Arc::new(FakeApi::new(|| success(1)));
    let mut page = RecordPage::new(api.clone(), Duration::from_millis(1500));
    page.load().await.unwrap();
    assert_eq!(api.list_calls.load(Ordering::SeqCst), 1);

    api.records.lock().unwrap().push(Contact {
        id: "c1".to_string(),
        name: "Asha".to_string(),
        phone: "123".to_string(),
        blood_group: None,
        lobby: None,
        designation: None,
        created_at: None,
        updated_at: None,
    });

    let dialog = page.import_dialog(ImportSettings::default());
    dialog.submit_json(&rows(1), false).await;
    assert!(!page.apply_refreshes().await.unwrap());

    dialog.closed().await;
    assert!(page.apply_refreshes().await.unwrap());
    assert_eq!(api.list_calls.load(Ordering::SeqCst), 2);
    assert_eq!(page.records().len(), 1);
}

#[tokio::test]
async fn test_closed_dialog_reopens_idle() {
    let api = Arc::new(FakeApi::new(|| success(1)));
    let (dialog, _rx) = dialog(api);

    assert!(dialog.request_close());
    assert!(!dialog.dismiss());
    assert!(dialog.open());
    assert_eq!(dialog.state(), DialogState::Idle);
}
