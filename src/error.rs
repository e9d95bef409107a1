//! Error types for the doc2md-client library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ClientError`]: a single request to the conversion service failed
//!   (connection refused, timeout, non-2xx status, undecodable body) or the
//!   client could not be set up (bad base URL, unreadable input file).
//!   Returned as `Err(ClientError)` from every [`crate::ApiClient`] method.
//!
//! * [`WorkflowError`]: the [`crate::Store`] refused to start a workflow
//!   because another one is still in flight. API failures never surface
//!   here: the store records them in [`crate::AppState::error`] instead.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by [`crate::ApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    // ── Transport errors ──────────────────────────────────────────────────
    /// The request never completed: connection refused, DNS failure, reset.
    #[error("Request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within the configured timeout.
    #[error("Request to '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    // ── Server errors ─────────────────────────────────────────────────────
    /// The server answered with a non-success status.
    ///
    /// `detail` is the server-provided `detail` field of a JSON error body.
    /// `message` is a non-JSON error body (e.g. from a reverse proxy), trimmed.
    #[error("Server returned {status}{}", status_suffix(.detail, .message))]
    Status {
        status: StatusCode,
        detail: Option<String>,
        message: Option<String>,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("Invalid response from '{url}': {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The document to upload could not be read from disk.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

fn status_suffix(detail: &Option<String>, message: &Option<String>) -> String {
    match detail.as_deref().or(message.as_deref()) {
        Some(text) => format!(": {text}"),
        None => String::new(),
    }
}

impl ClientError {
    /// The structured `detail` string the server attached to an error response.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// A human-readable message for this error, if one exists.
    ///
    /// Status errors only carry a message when the server sent a plain-text
    /// body; every other variant always has one.
    pub fn message(&self) -> Option<String> {
        match self {
            ClientError::Status { message, .. } => message.clone(),
            other => Some(other.to_string()),
        }
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Reasons a [`crate::Store`] workflow was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Another workflow holds the loading flag.
    #[error("Another request is already in progress")]
    InFlight,
}
