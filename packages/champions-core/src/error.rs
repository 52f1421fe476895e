//! Database error types.

use thiserror::Error;

/// Database operation errors.
#[derive(Error, Debug, Clone)]
pub enum DbError {
    /// No record carries the requested id
    #[error("Record '{id}' not found in table '{table}'")]
    RecordNotFound { table: String, id: String },

    /// A field failed its presence or type check
    #[error("Invalid field '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// Champion name already taken
    #[error("A champion named '{0}' already exists")]
    DuplicateName(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Lock poisoned (Mutex poisoned by a panicking handler)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}

impl DbError {
    /// Shorthand for a [`DbError::Validation`].
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        DbError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
