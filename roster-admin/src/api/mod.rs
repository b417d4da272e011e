//! Remote API access
//!
//! [`ApiClient`] owns the HTTP connection settings and the response/error
//! conventions shared by every endpoint. [`HttpRecordApi`] maps the
//! per-resource operations onto the API's URL scheme. Pages and dialogs talk
//! to the [`RecordApi`] trait so tests can substitute an in-memory fake.

pub mod client;
pub mod records;

use async_trait::async_trait;
use roster_common::models::{BulkResponse, DeleteAllResponse};
use roster_common::Resource;
use serde_json::Value;

use crate::error::AdminResult;

pub use client::{ApiClient, Reply, API_KEY_HEADER};
pub use records::HttpRecordApi;

/// A spreadsheet or CSV file ready to send
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Bulk endpoint response plus transport detail
#[derive(Debug, Clone)]
pub struct BulkReply {
    /// Server answered 206 Partial Content
    pub partial_content: bool,
    pub response: BulkResponse,
}

/// Operations available on one record collection
#[async_trait]
pub trait RecordApi<R: Resource>: Send + Sync {
    /// Fetch the full collection
    async fn list(&self) -> AdminResult<Vec<R>>;

    async fn create(&self, draft: &R::Draft) -> AdminResult<Option<R>>;

    async fn update(&self, id: &str, draft: &R::Draft) -> AdminResult<Option<R>>;

    async fn delete(&self, id: &str) -> AdminResult<()>;

    /// Delete every record; the confirmation token is always sent
    async fn delete_all(&self) -> AdminResult<DeleteAllResponse>;

    /// Submit an already validated JSON batch
    async fn bulk_create(&self, rows: &[Value], replace_all: bool) -> AdminResult<BulkReply>;

    /// Submit a spreadsheet/CSV file
    async fn bulk_upload(&self, file: UploadFile, replace_all: bool) -> AdminResult<BulkReply>;
}
