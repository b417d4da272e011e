//! Bulk import of contacts and documents
//!
//! The flow is split in three parts:
//! - [`validation`]: local checks on the JSON payload or selected file,
//!   producing a typed batch before any request is made
//! - [`report`]: the reconciled outcome of one attempt and its display form
//! - [`dialog`]: the per-attempt state machine with its auto-close timer

pub mod dialog;
pub mod report;
pub mod validation;

pub use dialog::{DialogState, FailureKind, ImportDialog, ImportFailure, ImportMode};
pub use report::{ImportReport, ReportView};
pub use validation::{select_file, validate_json_batch, FileSelection, ImportRejection, ValidatedBatch};
