//! Typed failures surfaced by the preview endpoints.
//!
//! Every variant maps to exactly one HTTP status, so the browser client can
//! branch on the status code instead of parsing the message.

use std::path::PathBuf;

use serde_json::json;
use thiserror::Error;

/// Failure of a preview operation.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// A required request field is missing or unusable.
    #[error("{0}")]
    InvalidInput(String),

    /// Heartbeat received before any entry was registered.
    #[error("No filename registered")]
    NotRegistered,

    /// The producer process has not sent a heartbeat within the timeout.
    #[error("Producer is not running")]
    ServiceUnavailable,

    /// The registered entry file is missing or unreadable.
    #[error("Entry not found: `{}`", .0.display())]
    NotFound(PathBuf),

    /// The entry exists but its front matter cannot be parsed.
    #[error("Malformed entry: {0}")]
    MalformedContent(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PreviewError {
    /// HTTP status code for this failure.
    pub const fn status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::NotRegistered => 400,
            Self::NotFound(_) => 404,
            Self::MalformedContent(_) | Self::Internal(_) => 500,
            Self::ServiceUnavailable => 503,
        }
    }

    /// Stable machine-readable name of the failure.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotRegistered => "not_registered",
            Self::ServiceUnavailable => "service_unavailable",
            Self::NotFound(_) => "not_found",
            Self::MalformedContent(_) => "malformed_content",
            Self::Internal(_) => "internal_error",
        }
    }

    /// JSON body sent to HTTP clients: `{error, kind, status}`.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "status": self.status(),
        })
    }
}
