//! roster-admin library interface
//!
//! Exposes the console components for the binary and integration tests.

pub mod api;
pub mod cli;
pub mod error;
pub mod import;
pub mod output;
pub mod page;
pub mod search;
pub mod session;
pub mod task;

pub use crate::error::{AdminError, AdminResult};
