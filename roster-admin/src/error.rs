//! Error types for roster-admin
//!
//! Failures fall into four groups: local input validation (no request was
//! made), transport/API failures, authentication failures and local storage
//! failures. Partial bulk outcomes are not errors; they are reported through
//! the import dialog state.

use reqwest::StatusCode;
use roster_common::validation::ValidationErrors;
use thiserror::Error;

/// Console error type
#[derive(Debug, Error)]
pub enum AdminError {
    /// Form or payload rejected before any network call
    #[error("{0}")]
    Validation(String),

    /// Non-2xx response; message taken from the response body when present
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    /// 2xx response whose envelope reported `success: false`
    #[error("{0}")]
    Rejected(String),

    /// Connection, timeout or body read failure
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Login refused
    #[error("{0}")]
    Auth(String),

    /// Command requires a logged-in session
    #[error("Not logged in. Run `roster-admin login` first")]
    NotAuthenticated,

    /// Operation not offered for this resource
    #[error("{0}")]
    Unsupported(String),

    /// roster-common error (config, storage I/O, serialization)
    #[error(transparent)]
    Common(#[from] roster_common::Error),
}

impl From<ValidationErrors> for AdminError {
    fn from(errors: ValidationErrors) -> Self {
        AdminError::Validation(errors.to_string())
    }
}

impl From<std::io::Error> for AdminError {
    fn from(err: std::io::Error) -> Self {
        AdminError::Common(roster_common::Error::Io(err))
    }
}

/// Result type for console operations
pub type AdminResult<T> = Result<T, AdminError>;
