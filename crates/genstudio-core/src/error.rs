//! Error types for the request layer

use thiserror::Error;

/// Errors produced by a rotating request.
///
/// Only [`RequestError::NoCredentialsAvailable`] is raised before the network is
/// touched. The other variants describe the outcome of a single candidate; the
/// caller sees the one produced by the last candidate tried.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("No credentials available for {context}")]
    NoCredentialsAvailable { context: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    RemoteRejection { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

impl RequestError {
    /// Whether the call failed because nothing could be tried at all.
    pub fn is_no_credentials(&self) -> bool {
        matches!(self, RequestError::NoCredentialsAvailable { .. })
    }

    /// HTTP status of a remote rejection, if that is what this error is.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::RemoteRejection { status, .. } => Some(*status),
            RequestError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors from the local credential stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to determine home directory")]
    NoHomeDir,

    #[error("Personal token is empty")]
    EmptyToken,
}

/// Result type alias for request operations
pub type Result<T> = std::result::Result<T, RequestError>;
