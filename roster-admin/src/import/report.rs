//! Reconciled bulk-import outcome and its display form

use roster_common::models::{BulkError, BulkResponse};
use std::collections::BTreeMap;

use crate::api::BulkReply;

/// Counts and row errors of one bulk attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub message: String,
    /// Unknown when the server reports an incomplete upload without a summary
    pub total: Option<u64>,
    pub created: u64,
    pub failed: Option<u64>,
    pub errors: Vec<BulkError>,
    pub errors_by_field: BTreeMap<String, u64>,
    pub errors_by_type: BTreeMap<String, u64>,
    /// Partial upload, lost connection or HTTP 206
    pub incomplete: bool,
}

impl ImportReport {
    pub fn from_reply(reply: &BulkReply) -> Self {
        Self::from_response(&reply.response, reply.partial_content)
    }

    /// Prefer the server's summary; otherwise derive counts from the rows
    pub fn from_response(response: &BulkResponse, partial_content: bool) -> Self {
        let incomplete = partial_content || response.is_incomplete();
        let summary = response.report.as_ref();

        let (total, failed) = match summary {
            Some(report) => (Some(report.total), Some(report.failed)),
            None if incomplete => (None, None),
            None => {
                let failed = response.errors.len() as u64;
                (Some(response.created + failed), Some(failed))
            }
        };

        let message = summary
            .and_then(|r| r.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| response.message.clone());

        Self {
            message,
            total,
            created: summary.map(|r| r.created).unwrap_or(response.created),
            failed,
            errors: response.errors.clone(),
            errors_by_field: summary
                .and_then(|r| r.errors_by_field.clone())
                .unwrap_or_default(),
            errors_by_type: summary
                .and_then(|r| r.errors_by_type.clone())
                .unwrap_or_default(),
            incomplete,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.failed.unwrap_or(0) > 0
    }

    /// Row error list capped at `visible` entries
    pub fn view(&self, visible: usize) -> ReportView {
        let lines = self
            .errors
            .iter()
            .take(visible)
            .map(|e| format!("Row {}: {}", e.row, e.error))
            .collect();
        ReportView {
            lines,
            hidden: self.errors.len().saturating_sub(visible),
        }
    }
}

/// The browsable part of a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportView {
    pub lines: Vec<String>,
    pub hidden: usize,
}

impl ReportView {
    pub fn truncation_notice(&self) -> Option<String> {
        (self.hidden > 0).then(|| format!("... and {} more errors", self.hidden))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_common::models::BulkReport;

    fn row_error(row: u64) -> BulkError {
        BulkError {
            row,
            error: format!("Phone is required on row {}", row),
            error_type: Some("validation".to_string()),
            field: Some("phone".to_string()),
        }
    }

    #[test]
    fn test_counts_derived_from_rows_without_summary() {
        let response = BulkResponse {
            success: true,
            message: "Created 3 contacts".to_string(),
            created: 3,
            errors: vec![row_error(2), row_error(5)],
            has_errors: true,
            ..Default::default()
        };

        let report = ImportReport::from_response(&response, false);
        assert_eq!(report.total, Some(5));
        assert_eq!(report.failed, Some(2));
        assert_eq!(report.created + report.failed.unwrap(), report.total.unwrap());
        assert!(!report.incomplete);
    }

    #[test]
    fn test_summary_takes_precedence() {
        let response = BulkResponse {
            success: true,
            message: "done".to_string(),
            created: 8,
            errors: vec![row_error(3)],
            has_errors: true,
            report: Some(BulkReport {
                total: 10,
                created: 8,
                failed: 2,
                errors_by_field: Some(BTreeMap::from([("phone".to_string(), 2)])),
                message: Some("8 of 10 rows imported".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let report = ImportReport::from_response(&response, false);
        assert_eq!(report.total, Some(10));
        assert_eq!(report.failed, Some(2));
        assert_eq!(report.message, "8 of 10 rows imported");
        assert_eq!(report.errors_by_field["phone"], 2);
    }

    #[test]
    fn test_partial_content_without_summary_has_unknown_totals() {
        let response = BulkResponse {
            success: true,
            message: "Upload interrupted".to_string(),
            created: 40,
            ..Default::default()
        };

        let report = ImportReport::from_response(&response, true);
        assert!(report.incomplete);
        assert_eq!(report.total, None);
        assert_eq!(report.created, 40);
    }

    #[test]
    fn test_view_caps_visible_rows() {
        let response = BulkResponse {
            errors: (1..=75).map(row_error).collect(),
            has_errors: true,
            ..Default::default()
        };
        let view = ImportReport::from_response(&response, false).view(50);

        assert_eq!(view.lines.len(), 50);
        assert_eq!(view.lines[0], "Row 1: Phone is required on row 1");
        assert_eq!(view.hidden, 25);
        assert_eq!(view.truncation_notice().as_deref(), Some("... and 25 more errors"));
    }

    #[test]
    fn test_no_notice_at_exact_cap() {
        let response = BulkResponse {
            errors: (1..=50).map(row_error).collect(),
            ..Default::default()
        };
        let view = ImportReport::from_response(&response, false).view(50);
        assert_eq!(view.lines.len(), 50);
        assert!(view.truncation_notice().is_none());
    }
}
