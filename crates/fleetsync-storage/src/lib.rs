//! Shared store contracts for the fleetsync coordination primitives.
//!
//! This crate defines the abstract contracts that any compliant backend
//! must implement:
//!
//! - [`TtlStore`] - a key-value store whose records expire automatically
//!   after a caller-supplied TTL. Used as the source of truth for
//!   credential revocation.
//! - [`LeaseStore`] - atomic, lease-based mutual exclusion with FIFO
//!   fairness among waiters. Used by the distributed lock.
//!
//! No wire format is defined here; the contracts are logical, so any
//! TTL-capable key-value backend (Redis, an in-memory map, a SQL table
//! with a reaper) can satisfy them.
//!
//! # Example
//!
//! ```ignore
//! use fleetsync_storage::{TtlStore, StorageError};
//!
//! async fn publish(store: &dyn TtlStore, key: &str) -> Result<(), StorageError> {
//!     store.put(key, 360).await
//! }
//! ```

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::{LeaseStore, TtlStore};
pub use types::LeaseToken;

/// Type alias for storage operation results.
pub type StorageResult<T> = Result<T, StorageError>;
