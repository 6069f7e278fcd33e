// crates/resilience/src/error.rs
//! Error type for retried operations

use thiserror::Error;

/// Outcome of a retry loop that never produced a success
///
/// Carries the caller's own error type so structured failures (status
/// codes, rejection bodies) survive the loop intact.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    #[error("All {attempts} attempts failed: {last_error}")]
    Exhausted { attempts: usize, last_error: E },

    /// The operation failed with a non-retryable error on some attempt
    #[error("Operation rejected without retry: {0}")]
    Rejected(E),
}

impl<E> RetryError<E> {
    /// Unwraps the underlying operation error
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last_error, .. } => last_error,
            Self::Rejected(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message() {
        let err: RetryError<&str> = RetryError::Exhausted {
            attempts: 3,
            last_error: "connection failed",
        };
        assert!(err.to_string().contains("3"));
        assert!(err.to_string().contains("connection failed"));
    }

    #[test]
    fn test_rejected_message() {
        let err: RetryError<&str> = RetryError::Rejected("400 Bad Request");
        assert!(err.to_string().contains("without retry"));
    }

    #[test]
    fn test_into_inner() {
        let err: RetryError<&str> = RetryError::Rejected("nope");
        assert_eq!(err.into_inner(), "nope");
    }
}
