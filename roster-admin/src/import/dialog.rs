//! Bulk-import dialog state machine
//!
//! Idle → Validating → Submitting → {Success | PartialSuccess | Failed}
//!
//! Success closes the dialog after the auto-close delay and asks the owning
//! page to refresh its list. PartialSuccess and Failed stay visible until
//! dismissed. Each submission carries an attempt number; closing, cancelling
//! or dismissing advances it, and a response belonging to an older attempt
//! no longer changes what the dialog shows.

use roster_common::config::ImportSettings;
use roster_common::{Resource, ResourceKind};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::report::{ImportReport, ReportView};
use super::validation::{select_file, validate_json_batch, ImportRejection};
use crate::api::{BulkReply, RecordApi};
use crate::error::AdminResult;
use crate::task::DelayedTask;

/// How the batch was supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Json,
    File,
}

impl ImportMode {
    fn default_failure(self) -> &'static str {
        match self {
            ImportMode::Json => "Bulk create failed",
            ImportMode::File => "Upload failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Refused locally, nothing was sent
    Validation,
    /// Request or response failed
    Transport,
    /// Server answered `success: false` without row errors
    Rejected,
    /// File upload abandoned by the user
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportFailure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogState {
    Idle,
    Validating,
    Submitting { mode: ImportMode },
    Success(ImportReport),
    PartialSuccess(ImportReport),
    Failed(ImportFailure),
    Closed,
}

impl DialogState {
    pub fn is_busy(&self) -> bool {
        matches!(self, DialogState::Validating | DialogState::Submitting { .. })
    }

    /// States from which a new submission may start
    fn accepts_input(&self) -> bool {
        matches!(self, DialogState::Idle | DialogState::Failed(_))
    }

    fn name(&self) -> &'static str {
        match self {
            DialogState::Idle => "idle",
            DialogState::Validating => "validating",
            DialogState::Submitting { .. } => "submitting",
            DialogState::Success(_) => "success",
            DialogState::PartialSuccess(_) => "partial_success",
            DialogState::Failed(_) => "failed",
            DialogState::Closed => "closed",
        }
    }
}

/// Map a bulk reply onto a terminal state
///
/// Only row errors make an outcome partial. An incomplete report (HTTP 206,
/// lost connection) that is otherwise clean still counts as success and
/// carries its `incomplete` flag for display.
pub fn reconcile(reply: &BulkReply, mode: ImportMode) -> DialogState {
    let report = ImportReport::from_reply(reply);
    let response = &reply.response;

    if response.has_row_errors() {
        DialogState::PartialSuccess(report)
    } else if response.success {
        DialogState::Success(report)
    } else {
        let message = if response.message.is_empty() {
            mode.default_failure().to_string()
        } else {
            response.message.clone()
        };
        DialogState::Failed(ImportFailure {
            kind: FailureKind::Rejected,
            message,
        })
    }
}

/// One import dialog bound to a record collection
///
/// Cheap to clone; clones share state, so a second submit from any clone
/// while one is in flight is ignored.
pub struct ImportDialog<R: Resource> {
    api: Arc<dyn RecordApi<R>>,
    settings: ImportSettings,
    state: Arc<watch::Sender<DialogState>>,
    attempt: Arc<AtomicU64>,
    auto_close: Arc<Mutex<Option<DelayedTask>>>,
    teardown: CancellationToken,
    refresh: mpsc::UnboundedSender<ResourceKind>,
}

impl<R: Resource> Clone for ImportDialog<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            settings: self.settings,
            state: self.state.clone(),
            attempt: self.attempt.clone(),
            auto_close: self.auto_close.clone(),
            teardown: self.teardown.clone(),
            refresh: self.refresh.clone(),
        }
    }
}

impl<R: Resource> ImportDialog<R> {
    /// `refresh` receives the collection kind whenever records were created
    pub fn new(
        api: Arc<dyn RecordApi<R>>,
        settings: ImportSettings,
        refresh: mpsc::UnboundedSender<ResourceKind>,
    ) -> Self {
        let (state, _rx) = watch::channel(DialogState::Idle);
        Self {
            api,
            settings,
            state: Arc::new(state),
            attempt: Arc::new(AtomicU64::new(0)),
            auto_close: Arc::new(Mutex::new(None)),
            teardown: CancellationToken::new(),
            refresh,
        }
    }

    pub fn state(&self) -> DialogState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DialogState> {
        self.state.subscribe()
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// Row errors of the current report, capped at the visible limit
    pub fn report_view(&self) -> Option<ReportView> {
        match &*self.state.borrow() {
            DialogState::Success(report) | DialogState::PartialSuccess(report) => {
                Some(report.view(self.settings.visible_errors))
            }
            _ => None,
        }
    }

    /// Validate and submit a JSON array of records
    pub async fn submit_json(&self, input: &str, replace_all: bool) -> DialogState {
        let Some(attempt) = self.begin() else {
            return self.state();
        };

        let batch = match validate_json_batch(R::KIND, input, self.settings.max_rows) {
            Ok(batch) => batch,
            Err(rejection) => return self.reject(attempt, rejection),
        };

        if !self.transition(attempt, DialogState::Submitting { mode: ImportMode::Json }) {
            return self.state();
        }
        info!(
            kind = %R::KIND,
            rows = batch.len(),
            replace_all,
            "Submitting bulk create"
        );

        let result = self.api.bulk_create(batch.rows(), replace_all).await;
        self.finish(attempt, ImportMode::Json, result)
    }

    /// Validate and upload a CSV or Excel file
    pub async fn submit_file(&self, path: Option<&Path>, replace_all: bool) -> DialogState {
        let Some(attempt) = self.begin() else {
            return self.state();
        };

        if !R::KIND.supports_file_upload() {
            return self.reject(attempt, ImportRejection::UploadUnsupported(R::KIND));
        }
        let selection = match select_file(path) {
            Ok(selection) => selection,
            Err(rejection) => return self.reject(attempt, rejection),
        };
        let file = match selection.read().await {
            Ok(file) => file,
            Err(e) => {
                let message = format!("Failed to read {}: {}", selection.file_name, e);
                return self.fail(attempt, FailureKind::Validation, message);
            }
        };

        if !self.transition(attempt, DialogState::Submitting { mode: ImportMode::File }) {
            return self.state();
        }
        info!(
            kind = %R::KIND,
            file = %file.file_name,
            bytes = file.bytes.len(),
            replace_all,
            "Uploading bulk file"
        );

        let result = self.api.bulk_upload(file, replace_all).await;
        self.finish(attempt, ImportMode::File, result)
    }

    /// Close the dialog
    ///
    /// Refused while a file upload is in flight. Closing a successful import
    /// before the auto-close delay refreshes the list immediately.
    pub fn request_close(&self) -> bool {
        let current = self.state();
        match current {
            DialogState::Submitting { mode: ImportMode::File } => {
                warn!(kind = %R::KIND, "Close refused while upload is in progress");
                return false;
            }
            DialogState::Success(_) => self.request_refresh(),
            DialogState::Closed => return true,
            _ => {}
        }
        self.invalidate();
        self.set(DialogState::Closed);
        true
    }

    /// Abandon an in-flight file upload
    ///
    /// The request itself keeps running; its result is discarded.
    pub fn cancel_upload(&self) -> bool {
        let cancelled = self.state.send_if_modified(|state| {
            if *state != (DialogState::Submitting { mode: ImportMode::File }) {
                return false;
            }
            self.attempt.fetch_add(1, Ordering::SeqCst);
            *state = DialogState::Failed(ImportFailure {
                kind: FailureKind::Cancelled,
                message: "Upload cancelled by user".to_string(),
            });
            true
        });
        if cancelled {
            info!(kind = %R::KIND, "Upload cancelled by user");
        }
        cancelled
    }

    /// Leave a result view and return to input
    pub fn dismiss(&self) -> bool {
        match self.state() {
            DialogState::Success(_) => self.request_refresh(),
            DialogState::PartialSuccess(_) | DialogState::Failed(_) => {}
            _ => return false,
        }
        self.invalidate();
        self.set(DialogState::Idle);
        true
    }

    /// Re-open a closed dialog
    pub fn open(&self) -> bool {
        if self.state() != DialogState::Closed {
            return false;
        }
        self.set(DialogState::Idle);
        true
    }

    /// Wait until the dialog reaches `Closed`
    pub async fn closed(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in self, so the channel cannot close while waiting
        let _ = rx.wait_for(|state| *state == DialogState::Closed).await;
    }

    /// Cancel timers and stop reacting to in-flight responses
    pub fn teardown(&self) {
        self.invalidate();
        self.teardown.cancel();
    }

    // ========================================
    // Internals
    // ========================================

    /// Claim a new attempt, or `None` when input is not accepted right now
    fn begin(&self) -> Option<u64> {
        let mut attempt = None;
        self.state.send_if_modified(|state| {
            if !state.accepts_input() {
                return false;
            }
            attempt = Some(self.attempt.fetch_add(1, Ordering::SeqCst) + 1);
            *state = DialogState::Validating;
            true
        });
        if attempt.is_none() {
            debug!(kind = %R::KIND, state = self.state().name(), "Submit ignored");
        }
        attempt
    }

    fn is_current(&self, attempt: u64) -> bool {
        self.attempt.load(Ordering::SeqCst) == attempt
    }

    /// Advance the attempt counter and drop any auto-close timer
    fn invalidate(&self) {
        self.attempt.fetch_add(1, Ordering::SeqCst);
        let mut slot = self.auto_close.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = slot.take() {
            task.cancel();
        }
    }

    fn set(&self, next: DialogState) {
        let previous = self.state.send_replace(next);
        debug!(
            kind = %R::KIND,
            from = previous.name(),
            to = self.state().name(),
            "Import dialog transition"
        );
    }

    /// Apply `next` if `attempt` is still the current one
    ///
    /// The attempt is checked under the channel's write lock, so a close or
    /// cancel that lands concurrently is never overwritten.
    fn transition(&self, attempt: u64, next: DialogState) -> bool {
        let mut from = None;
        self.state.send_if_modified(|state| {
            if !self.is_current(attempt) {
                return false;
            }
            from = Some(state.name());
            *state = next;
            true
        });
        match from {
            Some(from) => {
                debug!(
                    kind = %R::KIND,
                    from,
                    to = self.state().name(),
                    "Import dialog transition"
                );
                true
            }
            None => false,
        }
    }

    fn reject(&self, attempt: u64, rejection: ImportRejection) -> DialogState {
        info!(kind = %R::KIND, reason = %rejection, "Import rejected before submission");
        self.fail(attempt, FailureKind::Validation, rejection.to_string())
    }

    fn fail(&self, attempt: u64, kind: FailureKind, message: String) -> DialogState {
        self.transition(attempt, DialogState::Failed(ImportFailure { kind, message }));
        self.state()
    }

    fn finish(&self, attempt: u64, mode: ImportMode, result: AdminResult<BulkReply>) -> DialogState {
        let created = result.as_ref().map_or(0, |reply| reply.response.created);
        let next = match &result {
            Ok(reply) => reconcile(reply, mode),
            Err(e) => DialogState::Failed(ImportFailure {
                kind: FailureKind::Transport,
                message: e.to_string(),
            }),
        };

        if !self.transition(attempt, next.clone()) {
            match &result {
                Ok(_) if created > 0 => {
                    info!(
                        kind = %R::KIND,
                        created,
                        "Late bulk result after close, refreshing list"
                    );
                    self.request_refresh();
                }
                Ok(_) => debug!(kind = %R::KIND, "Discarding late bulk result"),
                Err(e) => debug!(kind = %R::KIND, error = %e, "Discarding late bulk error"),
            }
            return self.state();
        }

        match &next {
            DialogState::Success(report) => {
                info!(
                    kind = %R::KIND,
                    created = report.created,
                    incomplete = report.incomplete,
                    "Bulk import succeeded"
                );
                self.schedule_auto_close(attempt);
            }
            DialogState::PartialSuccess(report) => {
                info!(
                    kind = %R::KIND,
                    created = report.created,
                    failed = ?report.failed,
                    incomplete = report.incomplete,
                    "Bulk import completed with errors"
                );
                if report.created > 0 {
                    self.request_refresh();
                }
            }
            DialogState::Failed(failure) if failure.kind == FailureKind::Transport => {
                warn!(kind = %R::KIND, error = %failure.message, "Bulk request failed");
            }
            _ => {}
        }
        self.state()
    }

    fn schedule_auto_close(&self, attempt: u64) {
        let state = self.state.clone();
        let counter = self.attempt.clone();
        let refresh = self.refresh.clone();
        let task = DelayedTask::schedule(
            &self.teardown,
            self.settings.auto_close_delay,
            move || async move {
                // Refresh is queued before waiters on `Closed` are notified
                let closed = state.send_if_modified(|current| {
                    if counter.load(Ordering::SeqCst) != attempt {
                        return false;
                    }
                    let _ = refresh.send(R::KIND);
                    *current = DialogState::Closed;
                    true
                });
                if closed {
                    debug!(kind = %R::KIND, "Import dialog auto-closed");
                }
            },
        );

        let mut slot = self.auto_close.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(task);
    }

    fn request_refresh(&self) {
        if self.refresh.send(R::KIND).is_err() {
            debug!(kind = %R::KIND, "Refresh receiver dropped");
        }
    }
}
