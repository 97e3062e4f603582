//! Storage error types for the shared store abstraction layer.
//!
//! This module defines all error types that can occur during store
//! operations. Infrastructure failures must always surface as errors,
//! never as a default answer: callers of the revocation path decide
//! whether to fail open or fail closed.

use std::fmt;

/// Errors that can occur during shared store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to reach the storage backend.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// A store operation did not complete within the backend's deadline.
    #[error("Operation timed out: {message}")]
    Timeout {
        /// Description of the timed-out operation.
        message: String,
    },

    /// Failed to encode or decode a stored value.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection { .. } => ErrorCategory::Infrastructure,
            Self::Timeout { .. } => ErrorCategory::Infrastructure,
            Self::Serialization { .. } => ErrorCategory::Serialization,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Infrastructure/connection error.
    Infrastructure,
    /// Value encoding/decoding error.
    Serialization,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Serialization => write!(f, "serialization"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::connection("redis unreachable");
        assert_eq!(err.to_string(), "Connection error: redis unreachable");

        let err = StorageError::timeout("EXISTS took too long");
        assert_eq!(err.to_string(), "Operation timed out: EXISTS took too long");
    }

    #[test]
    fn test_error_predicates() {
        let err = StorageError::connection("down");
        assert!(err.is_connection());
        assert!(!err.is_timeout());

        let err = StorageError::timeout("slow");
        assert!(err.is_timeout());
        assert!(!err.is_connection());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::connection("down").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            StorageError::timeout("slow").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            StorageError::serialization("bad payload").category(),
            ErrorCategory::Serialization
        );
        assert_eq!(
            StorageError::internal("bug").category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
        assert_eq!(ErrorCategory::Serialization.to_string(), "serialization");
        assert_eq!(ErrorCategory::Internal.to_string(), "internal");
    }
}
