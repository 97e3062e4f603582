//! Coordination error types.
//!
//! This module defines all error types that can occur in the revocation
//! cache and the distributed lock. The taxonomy is deliberately small:
//! callers of the revocation path must be able to distinguish "the store
//! is down" from "not revoked" so they can choose to fail open or fail
//! closed themselves.

use std::fmt;
use std::time::Duration;

use fleetsync_storage::StorageError;

/// Errors that can occur during coordination operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordError {
    /// The caller supplied an empty or blank identifier. No I/O was
    /// performed.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// The credential could not be parsed far enough to determine its
    /// expiry, so no revocation TTL can be computed. No store write was
    /// performed.
    #[error("Malformed credential: {message}")]
    MalformedCredential {
        /// Description of why parsing failed.
        message: String,
    },

    /// The shared store could not be reached or failed at the
    /// infrastructure level. Never converted to a default answer.
    #[error("Shared store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the store failure.
        message: String,
    },

    /// The lease was not granted within the wait budget; the critical
    /// section was never entered.
    #[error("Lock '{name}' not granted within {waited:?}")]
    LockTimeout {
        /// Name of the contested lock.
        name: String,
        /// How long the caller waited.
        waited: Duration,
    },
}

impl CoordError {
    /// Creates a new `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a new `MalformedCredential` error.
    #[must_use]
    pub fn malformed_credential(message: impl Into<String>) -> Self {
        Self::MalformedCredential {
            message: message.into(),
        }
    }

    /// Creates a new `StoreUnavailable` error.
    #[must_use]
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `LockTimeout` error.
    #[must_use]
    pub fn lock_timeout(name: impl Into<String>, waited: Duration) -> Self {
        Self::LockTimeout {
            name: name.into(),
            waited,
        }
    }

    /// Returns `true` if the caller can fix this error by changing its
    /// input (as opposed to retrying later).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::MalformedCredential { .. }
        )
    }

    /// Returns `true` if this error reflects shared-store infrastructure
    /// trouble.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Returns `true` if this is a lock wait timeout.
    #[must_use]
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } => ErrorCategory::Validation,
            Self::MalformedCredential { .. } => ErrorCategory::Credential,
            Self::StoreUnavailable { .. } => ErrorCategory::Infrastructure,
            Self::LockTimeout { .. } => ErrorCategory::Lock,
        }
    }
}

impl From<StorageError> for CoordError {
    /// Every infrastructure-level store failure surfaces uniformly as
    /// `StoreUnavailable`; the underlying message is preserved.
    fn from(err: StorageError) -> Self {
        Self::StoreUnavailable {
            message: err.to_string(),
        }
    }
}

/// Categories of coordination errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request validation errors.
    Validation,
    /// Credential parsing errors.
    Credential,
    /// Shared-store infrastructure errors.
    Infrastructure,
    /// Lock acquisition errors.
    Lock,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Credential => write!(f, "credential"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Lock => write!(f, "lock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoordError::invalid_argument("credential must not be blank");
        assert_eq!(
            err.to_string(),
            "Invalid argument: credential must not be blank"
        );

        let err = CoordError::malformed_credential("missing exp claim");
        assert_eq!(err.to_string(), "Malformed credential: missing exp claim");

        let err = CoordError::lock_timeout("reindex", Duration::from_secs(30));
        assert!(err.to_string().contains("reindex"));
    }

    #[test]
    fn test_error_predicates() {
        let err = CoordError::invalid_argument("blank");
        assert!(err.is_client_error());
        assert!(!err.is_infrastructure());

        let err = CoordError::malformed_credential("bad");
        assert!(err.is_client_error());

        let err = CoordError::store_unavailable("redis down");
        assert!(!err.is_client_error());
        assert!(err.is_infrastructure());

        let err = CoordError::lock_timeout("x", Duration::from_secs(1));
        assert!(err.is_lock_timeout());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            CoordError::invalid_argument("blank").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            CoordError::malformed_credential("bad").category(),
            ErrorCategory::Credential
        );
        assert_eq!(
            CoordError::store_unavailable("down").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            CoordError::lock_timeout("x", Duration::from_secs(1)).category(),
            ErrorCategory::Lock
        );
    }

    #[test]
    fn test_storage_error_maps_to_store_unavailable() {
        let err: CoordError = StorageError::connection("redis unreachable").into();
        assert!(err.is_infrastructure());
        assert!(err.to_string().contains("redis unreachable"));
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Credential.to_string(), "credential");
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
        assert_eq!(ErrorCategory::Lock.to_string(), "lock");
    }
}
