//! Text rendering for command output

use roster_common::models::{DeleteAllResponse, Principal};
use roster_common::{Contact, Document};

use crate::import::{DialogState, FailureKind, ImportReport};

/// A record that can be printed as one table row
pub trait TableRow {
    fn headers() -> &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl TableRow for Contact {
    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Phone", "Blood", "Lobby", "Designation"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.phone.clone(),
            self.blood_group.clone().unwrap_or_default(),
            self.lobby.clone().unwrap_or_default(),
            self.designation.clone().unwrap_or_default(),
        ]
    }
}

impl TableRow for Document {
    fn headers() -> &'static [&'static str] {
        &["ID", "Title", "Link", "Uploaded by"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.title.clone(),
            self.link.clone(),
            self.uploaded_by.clone().unwrap_or_default(),
        ]
    }
}

pub struct CliFormatter;

impl CliFormatter {
    /// Column-aligned table followed by a count line
    pub fn format_table<R: TableRow>(records: &[&R]) -> String {
        let headers = R::headers();
        let rows: Vec<Vec<String>> = records.iter().map(|r| r.cells()).collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let render = |cells: Vec<String>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut output = String::new();
        output.push_str(&render(headers.iter().map(|h| h.to_string()).collect()));
        output.push('\n');
        for row in rows {
            output.push_str(&render(row));
            output.push('\n');
        }
        output.push_str(&format!("{} record(s)\n", records.len()));
        output
    }

    pub fn format_import_report(report: &ImportReport, visible_errors: usize) -> String {
        let mut output = String::new();

        if !report.message.is_empty() {
            output.push_str(&format!("{}\n", report.message));
        }
        if report.incomplete {
            output.push_str("Upload may be incomplete; verify the records on the server.\n");
        }

        let count = |value: Option<u64>| {
            value
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        };
        output.push_str(&format!(
            "Total: {}  Created: {}  Failed: {}\n",
            count(report.total),
            report.created,
            count(report.failed)
        ));

        for (field, n) in &report.errors_by_field {
            output.push_str(&format!("  {}: {} error(s)\n", field, n));
        }
        for (kind, n) in &report.errors_by_type {
            output.push_str(&format!("  {} errors: {}\n", kind, n));
        }

        let view = report.view(visible_errors);
        if !view.lines.is_empty() {
            output.push_str("\nErrors:\n");
            for line in &view.lines {
                output.push_str(&format!("  {}\n", line));
            }
            if let Some(notice) = view.truncation_notice() {
                output.push_str(&format!("  {}\n", notice));
            }
        }

        output
    }

    pub fn format_dialog_state(state: &DialogState, visible_errors: usize) -> String {
        match state {
            DialogState::Success(report) => {
                let mut output = Self::format_import_report(report, visible_errors);
                output.insert_str(0, "Import succeeded\n");
                output
            }
            DialogState::PartialSuccess(report) => {
                let mut output = Self::format_import_report(report, visible_errors);
                output.insert_str(0, "Import completed with errors\n");
                output
            }
            DialogState::Failed(failure) => match failure.kind {
                FailureKind::Validation => format!("Rejected: {}\n", failure.message),
                _ => format!("Import failed: {}\n", failure.message),
            },
            DialogState::Closed => "Import closed\n".to_string(),
            DialogState::Idle | DialogState::Validating | DialogState::Submitting { .. } => {
                String::new()
            }
        }
    }

    pub fn format_delete_all(response: &DeleteAllResponse) -> String {
        if response.message.is_empty() {
            format!("Deleted {} record(s)\n", response.count)
        } else {
            format!("{} ({} deleted)\n", response.message, response.count)
        }
    }

    pub fn format_principal(principal: Option<&Principal>) -> String {
        match principal {
            Some(p) => format!("Logged in as {}\n", p.username),
            None => "Not logged in\n".to_string(),
        }
    }
}
