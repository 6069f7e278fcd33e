//! Error types for FleetSync
//!
//! This module provides the shared error taxonomy for local store and
//! validation failures:
//! - **Degraded**: one record was skipped but the pass continues
//! - **Fatal**: local state is invalid and the caller must intervene
//!
//! Transient remote failures are classified separately by the remote
//! client's error type. Every error here carries a `user_message()`
//! suitable for a UI notification; raw sources are kept behind
//! `#[source]` for logs only.

use std::fmt;
use thiserror::Error;

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Operation skipped but processing can continue
    Degraded,
    /// Critical error requiring user intervention
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for FleetSync
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Database Errors =====
    /// Database operation failed
    #[error("Database error: {message}")]
    DatabaseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database migration failed
    #[error("Migration failed: {version} - {reason}")]
    MigrationFailed { version: String, reason: String },

    /// Record not found in database
    #[error("Record not found: {entity} with {identifier}")]
    RecordNotFound { entity: String, identifier: String },

    // ===== Validation Errors =====
    /// A JSON-typed text field failed to parse
    #[error("Invalid JSON in field '{field}': {reason}")]
    InvalidJsonField { field: String, reason: String },

    /// Field value failed a domain validation rule
    #[error("Validation failed: {field} - {reason}")]
    ValidationFailed { field: String, reason: String },

    /// A business key collided with an existing record
    #[error("Duplicate {entity}: {details}")]
    DuplicateRecord { entity: String, details: String },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::RecordNotFound { .. } | Self::InvalidJsonField { .. } => ErrorSeverity::Degraded,
            Self::DatabaseError { .. }
            | Self::MigrationFailed { .. }
            | Self::ValidationFailed { .. }
            | Self::DuplicateRecord { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns a message suitable for direct display in a UI notification
    pub fn user_message(&self) -> String {
        match self {
            Self::DatabaseError { message, .. } => {
                format!("A local storage problem occurred: {message}")
            }
            Self::MigrationFailed { version, .. } => {
                format!("The local database could not be upgraded (migration {version})")
            }
            Self::RecordNotFound { entity, identifier } => {
                format!("{entity} '{identifier}' was not found")
            }
            Self::InvalidJsonField { field, .. } => {
                format!("The field '{field}' must contain valid JSON")
            }
            Self::ValidationFailed { field, reason } => format!("{field}: {reason}"),
            Self::DuplicateRecord { entity, details } => {
                format!("A {entity} with the same key already exists: {details}")
            }
        }
    }

    /// Helper to create a database error with a source
    pub fn database<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::DatabaseError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias used throughout FleetSync
pub type Result<T> = std::result::Result<T, AppError>;
