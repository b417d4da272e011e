//! Response envelopes returned by the roster API

use serde::{Deserialize, Serialize};

/// Field-level error reported by the API on validation failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiFieldError {
    #[serde(default)]
    pub field: Option<String>,
    pub message: String,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Generic `{success, data?, message?}` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<ApiFieldError>>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Payload of the document count endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountData {
    pub count: u64,
}
