//! Error types for the synchronization engine

use fleetsync_core::AppError;
use fleetsync_remote::RemoteError;
use thiserror::Error;

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while synchronizing
#[derive(Debug, Error)]
pub enum SyncError {
    /// Another reconciliation pass holds the in-progress guard
    #[error("A synchronization pass is already in progress")]
    InProgress,

    /// Local store or validation failure
    #[error(transparent)]
    App(#[from] AppError),

    /// Remote API failure
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl SyncError {
    /// Message suitable for CLI output
    pub fn user_message(&self) -> String {
        match self {
            Self::InProgress => "A sync is already running, try again later".to_string(),
            Self::App(e) => e.user_message(),
            Self::Remote(e) => format!("Remote API error: {e}"),
        }
    }
}
