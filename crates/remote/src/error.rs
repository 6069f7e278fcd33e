// crates/remote/src/error.rs
//! Error types for remote API operations

use thiserror::Error;

/// Result type for remote API operations
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur talking to the remote API
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP transport error (connect failure, timeout, protocol error)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with an explicit rejection (4xx with a body);
    /// never retried, surfaced to the caller as-is
    #[error("Remote rejected the request: {body} (status {status})")]
    Rejected { status: u16, body: String },

    /// The remote answered with an unexpected status (5xx or anything
    /// outside the operation's success set)
    #[error("Unexpected remote status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body could not be interpreted
    #[error("Malformed remote response: {0}")]
    MalformedResponse(String),

    /// All retry attempts exhausted
    #[error("Remote call failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },
}

impl RemoteError {
    /// Returns true if the failure is transient and the call may be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::UnexpectedStatus { status, .. } => *status >= 500,
            Self::Rejected { .. }
            | Self::MalformedResponse(_)
            | Self::RetriesExhausted { .. } => false,
        }
    }
}
