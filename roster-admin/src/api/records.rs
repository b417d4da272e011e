//! Resource endpoints

use async_trait::async_trait;
use reqwest::{multipart, Method, StatusCode};
use roster_common::models::{ApiResponse, BulkResponse, CountData, DeleteAllResponse};
use roster_common::Resource;
use serde_json::Value;
use std::marker::PhantomData;
use tracing::info;

use super::{ApiClient, BulkReply, RecordApi, UploadFile};
use crate::error::{AdminError, AdminResult};

/// Confirmation token required by the delete-all endpoints
pub const DELETE_ALL_CONFIRMATION: &str = "DELETE_ALL";

/// [`RecordApi`] over HTTP for one resource type
pub struct HttpRecordApi<R> {
    client: ApiClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for HttpRecordApi<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _resource: PhantomData,
        }
    }
}

/// Turn a `success: false` envelope into an error
fn ensure_success<T>(response: ApiResponse<T>) -> AdminResult<ApiResponse<T>> {
    if response.success {
        Ok(response)
    } else {
        Err(AdminError::Rejected(
            response
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Operation failed".to_string()),
        ))
    }
}

impl<R: Resource> HttpRecordApi<R> {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    fn path(&self, suffix: &str) -> String {
        format!("{}{}", R::KIND.collection_path(), suffix)
    }

    fn admin_path(&self, action: &str) -> String {
        self.path(&format!("/admin/{}{}", action, R::KIND.entity()))
    }

    /// Fetch a single record by id
    pub async fn get(&self, id: &str) -> AdminResult<Option<R>> {
        let builder = self.client.request(Method::GET, &self.path(&format!("/{}", id)));
        let reply = self.client.execute::<ApiResponse<R>>(builder).await?;
        Ok(ensure_success(reply.body)?.data)
    }

    /// Server-side search
    pub async fn search(&self, query: &str) -> AdminResult<Vec<R>> {
        let builder = self
            .client
            .request(Method::GET, &self.path("/search"))
            .query(&[("query", query)]);
        let reply = self.client.execute::<ApiResponse<Vec<R>>>(builder).await?;
        Ok(ensure_success(reply.body)?.data.unwrap_or_default())
    }

    /// Number of records held by the server
    pub async fn count(&self) -> AdminResult<u64> {
        let builder = self.client.request(Method::GET, &self.path("/count"));
        let reply = self.client.execute::<ApiResponse<CountData>>(builder).await?;
        let response = ensure_success(reply.body)?;
        response
            .data
            .map(|d| d.count)
            .or(response.count)
            .ok_or_else(|| AdminError::Decode("count endpoint returned no count".to_string()))
    }
}

#[async_trait]
impl<R: Resource> RecordApi<R> for HttpRecordApi<R> {
    async fn list(&self) -> AdminResult<Vec<R>> {
        let builder = self.client.request(Method::GET, &self.path("/all"));
        let reply = self.client.execute::<ApiResponse<Vec<R>>>(builder).await?;
        Ok(ensure_success(reply.body)?.data.unwrap_or_default())
    }

    async fn create(&self, draft: &R::Draft) -> AdminResult<Option<R>> {
        let builder = self
            .client
            .request(Method::POST, &self.admin_path("create"))
            .json(draft);
        let reply = self.client.execute::<ApiResponse<R>>(builder).await?;
        Ok(ensure_success(reply.body)?.data)
    }

    async fn update(&self, id: &str, draft: &R::Draft) -> AdminResult<Option<R>> {
        let path = format!("{}/{}", self.admin_path("update"), id);
        let builder = self.client.request(Method::PUT, &path).json(draft);
        let reply = self.client.execute::<ApiResponse<R>>(builder).await?;
        Ok(ensure_success(reply.body)?.data)
    }

    async fn delete(&self, id: &str) -> AdminResult<()> {
        let path = format!("{}/{}", self.admin_path("delete"), id);
        let builder = self.client.request(Method::DELETE, &path);
        let reply = self.client.execute::<ApiResponse<Value>>(builder).await?;
        ensure_success(reply.body)?;
        Ok(())
    }

    async fn delete_all(&self) -> AdminResult<DeleteAllResponse> {
        let path = format!("{}s", self.admin_path("deleteAll"));
        let builder = self
            .client
            .request(Method::DELETE, &path)
            .query(&[("confirm", DELETE_ALL_CONFIRMATION)]);
        let reply = self.client.execute::<DeleteAllResponse>(builder).await?;
        if !reply.body.success {
            return Err(AdminError::Rejected(if reply.body.message.is_empty() {
                "Operation failed".to_string()
            } else {
                reply.body.message
            }));
        }
        info!(kind = %R::KIND, count = reply.body.count, "Deleted all records");
        Ok(reply.body)
    }

    async fn bulk_create(&self, rows: &[Value], replace_all: bool) -> AdminResult<BulkReply> {
        let builder = self
            .client
            .request(Method::POST, &self.path("/admin/bulk"))
            .query(&[("replaceAll", replace_all)])
            .json(rows);
        let reply = self.client.execute::<BulkResponse>(builder).await?;
        Ok(BulkReply {
            partial_content: reply.status == StatusCode::PARTIAL_CONTENT,
            response: reply.body,
        })
    }

    async fn bulk_upload(&self, file: UploadFile, replace_all: bool) -> AdminResult<BulkReply> {
        if !R::KIND.supports_file_upload() {
            return Err(AdminError::Unsupported(format!(
                "File upload is not supported for {}",
                R::KIND
            )));
        }

        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(file.mime_type)?;
        let form = multipart::Form::new().part("file", part);
        let builder = self
            .client
            .request(Method::POST, &self.path("/admin/bulk-upload"))
            .query(&[("replaceAll", replace_all)])
            .multipart(form);
        let reply = self.client.execute::<BulkResponse>(builder).await?;
        Ok(BulkReply {
            partial_content: reply.status == StatusCode::PARTIAL_CONTENT,
            response: reply.body,
        })
    }
}
