//! Audit subsystem errors.

/// Errors raised by audit storage backends.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Underlying file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}
