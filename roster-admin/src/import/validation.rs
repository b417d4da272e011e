//! Pre-submission checks for bulk imports

use roster_common::ResourceKind;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::api::UploadFile;

/// File extensions accepted by the upload endpoint
pub const ACCEPTED_EXTENSIONS: [&str; 3] = [".csv", ".xlsx", ".xls"];

/// Reason a payload was refused locally
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportRejection {
    #[error("JSON input is required")]
    EmptyInput,

    #[error("Invalid JSON format")]
    InvalidJson,

    #[error("JSON must be an array of {0}")]
    NotAnArray(ResourceKind),

    #[error("{} array cannot be empty", .0.title())]
    EmptyArray(ResourceKind),

    #[error("Maximum {max} {kind} allowed per request")]
    TooManyRows { kind: ResourceKind, max: usize },

    #[error("Please select a file")]
    NoFile,

    #[error("Only CSV and Excel files (.csv, .xlsx, .xls) are allowed")]
    UnsupportedFileType(String),

    #[error("File upload is not supported for {0}")]
    UploadUnsupported(ResourceKind),
}

/// A JSON array of 1..=max candidate rows
///
/// Row contents are passed through untouched; the server validates each row
/// and reports failures per row.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBatch {
    kind: ResourceKind,
    rows: Vec<Value>,
}

impl ValidatedBatch {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Check user-supplied JSON before it is submitted
pub fn validate_json_batch(
    kind: ResourceKind,
    input: &str,
    max_rows: usize,
) -> Result<ValidatedBatch, ImportRejection> {
    if input.trim().is_empty() {
        return Err(ImportRejection::EmptyInput);
    }

    let value: Value = serde_json::from_str(input).map_err(|_| ImportRejection::InvalidJson)?;
    let rows = match value {
        Value::Array(rows) => rows,
        _ => return Err(ImportRejection::NotAnArray(kind)),
    };

    if rows.is_empty() {
        return Err(ImportRejection::EmptyArray(kind));
    }
    if rows.len() > max_rows {
        return Err(ImportRejection::TooManyRows { kind, max: max_rows });
    }

    Ok(ValidatedBatch { kind, rows })
}

/// A file that passed the extension check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub path: PathBuf,
    pub file_name: String,
    /// Lowercase, including the leading dot
    pub extension: String,
}

impl FileSelection {
    pub fn mime_type(&self) -> &'static str {
        match self.extension.as_str() {
            ".csv" => "text/csv",
            ".xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ".xls" => "application/vnd.ms-excel",
            _ => "application/octet-stream",
        }
    }

    pub async fn read(&self) -> std::io::Result<UploadFile> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(UploadFile {
            file_name: self.file_name.clone(),
            mime_type: self.mime_type(),
            bytes,
        })
    }
}

/// Accept `.csv`, `.xlsx` and `.xls` files, case-insensitively
///
/// The extension is everything from the last `.` of the file name.
pub fn select_file(path: Option<&Path>) -> Result<FileSelection, ImportRejection> {
    let path = path.ok_or(ImportRejection::NoFile)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or(ImportRejection::NoFile)?;

    let extension = file_name
        .rfind('.')
        .map(|idx| file_name[idx..].to_lowercase())
        .unwrap_or_default();

    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ImportRejection::UnsupportedFileType(file_name));
    }

    Ok(FileSelection {
        path: path.to_path_buf(),
        file_name,
        extension,
    })
}
