//! Bulk create / upload wire types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One rejected row of a bulk request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkError {
    pub row: u64,
    pub error: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Server-side summary attached to upload responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    pub total: u64,
    pub created: u64,
    pub failed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors_by_type: Option<BTreeMap<String, u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors_by_field: Option<BTreeMap<String, u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_lost: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_upload: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_contacts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_processed_contacts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response of both `bulk` (JSON) and `bulk-upload` (file) endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub errors: Vec<BulkError>,
    #[serde(default)]
    pub has_errors: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_upload: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_lost: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<BulkReport>,
}

impl BulkResponse {
    /// Per-row errors were reported
    pub fn has_row_errors(&self) -> bool {
        self.has_errors || !self.errors.is_empty()
    }

    /// The server flagged the report as known-incomplete
    pub fn is_incomplete(&self) -> bool {
        let flagged = |flag: Option<bool>| flag.unwrap_or(false);
        flagged(self.partial_upload)
            || flagged(self.connection_lost)
            || self
                .report
                .as_ref()
                .map(|r| flagged(r.partial_upload) || flagged(r.connection_lost))
                .unwrap_or(false)
    }
}

/// Response of the delete-all endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteAllResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_with_report() {
        let json = r#"{
            "success": true,
            "message": "Upload completed with errors",
            "created": 8,
            "errors": [{"row": 3, "error": "Phone is required", "type": "validation", "field": "phone"}],
            "hasErrors": true,
            "report": {
                "total": 10,
                "created": 8,
                "failed": 2,
                "errorsByField": {"phone": 2}
            }
        }"#;

        let response: BulkResponse = serde_json::from_str(json).unwrap();
        assert!(response.has_row_errors());
        assert!(!response.is_incomplete());
        assert_eq!(response.errors[0].error_type.as_deref(), Some("validation"));
        let report = response.report.unwrap();
        assert_eq!(report.total, 10);
        assert_eq!(report.errors_by_field.unwrap()["phone"], 2);
    }

    #[test]
    fn test_incomplete_flag_on_nested_report() {
        let json = r#"{
            "success": true,
            "message": "Connection lost",
            "created": 120,
            "errors": [],
            "hasErrors": false,
            "report": {"total": 500, "created": 120, "failed": 0, "connectionLost": true}
        }"#;

        let response: BulkResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_incomplete());
        assert!(!response.has_row_errors());
    }

    #[test]
    fn test_minimal_bulk_create_response() {
        let json = r#"{"success": true, "message": "Created 2 contacts", "created": 2, "errors": [], "hasErrors": false}"#;
        let response: BulkResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.created, 2);
        assert!(response.report.is_none());
    }
}
