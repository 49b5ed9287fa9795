use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    Failed(String),
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),
    #[error("Driver not available: {0} (not compiled)")]
    DriverNotAvailable(&'static str),
    #[error("Unknown driver: {0}")]
    UnknownDriver(String),

    #[error("Connection is closed or invalid")]
    SessionClosed,
    #[error("Connection is already closed")]
    AlreadyClosed,

    /// Malformed condition/field/value input, raised before the backend is called.
    #[error("Invalid request: {0}")]
    Translation(String),

    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} internal fault: {message}")]
    Internal {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },
}

impl DbError {
    pub fn translation(message: impl Into<String>) -> Self {
        DbError::Translation(message.into())
    }

    pub fn backend(operation: &'static str, err: impl std::fmt::Display) -> Self {
        DbError::Backend {
            operation,
            message: err.to_string(),
        }
    }

    pub fn internal(operation: &'static str, err: impl std::fmt::Display) -> Self {
        DbError::Internal {
            operation,
            message: err.to_string(),
        }
    }

    /// Whether the error came out of the session rather than out of request
    /// validation. Only these are kept as a connection's last error.
    pub fn is_session_failure(&self) -> bool {
        matches!(
            self,
            DbError::Backend { .. }
                | DbError::Internal { .. }
                | DbError::Timeout { .. }
                | DbError::Cancelled { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
