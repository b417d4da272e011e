//! # Roster Common Library
//!
//! Shared code for the roster administration console:
//! - Record types (contacts, documents) and their drafts
//! - API envelope and bulk-import report types
//! - Form validation for record drafts and login credentials
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

pub use error::{Error, Result};
pub use models::{Contact, Document, Resource, ResourceKind};
