//! Record and wire types for the roster API
//!
//! Field names follow the API's camelCase JSON; Rust names are snake_case.

pub mod api;
pub mod auth;
pub mod bulk;
pub mod contact;
pub mod document;
pub mod resource;

pub use api::{ApiFieldError, ApiResponse, CountData, Pagination};
pub use auth::{LoginCredentials, Principal};
pub use bulk::{BulkError, BulkReport, BulkResponse, DeleteAllResponse};
pub use contact::{Contact, ContactDraft};
pub use document::{Document, DocumentDraft};
pub use resource::{Resource, ResourceKind};
