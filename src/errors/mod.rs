//! Error handling module for the Pet Pals client.
//!
//! Every failure a screen can encounter collapses into [`AppError`]:
//! validation problems caught before any network call, missing sessions,
//! records that do not exist, and remote failures from the backend. No
//! error is fatal to the process; screens render the message and stop.

use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const REMOTE_ERROR: &str = "REMOTE_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Form-level validation failure, raised before any network call
    Validation(String),
    /// No current session, or the backend rejected the credentials
    Unauthorized(String),
    /// A requested identifier resolves to no record
    NotFound(String),
    /// Any record/object/session store call failing remotely
    Remote(String),
}

impl AppError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Remote(_) => codes::REMOTE_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::Remote(msg) => msg,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Transport error: {:?}", err);
        AppError::Remote(format!("Request failed: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::Remote(format!("Malformed backend response: {}", err))
    }
}

/// Error body returned by the backend on failed requests.
///
/// The auth endpoints use `error_description`, the rest of the API uses
/// `message`; either may be missing entirely.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RemoteErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl RemoteErrorBody {
    /// Best human-readable message out of the body, with a fallback.
    pub fn describe(&self, fallback: &str) -> String {
        self.error_description
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or(fallback)
            .to_string()
    }
}
