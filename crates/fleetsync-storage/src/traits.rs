//! Store traits for the fleetsync storage abstraction layer.
//!
//! This module defines the two contracts all backends must implement.
//! Implementations must be thread-safe (`Send + Sync`); every method may
//! block on network I/O and must not be assumed cheap.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::LeaseToken;

/// A key-value store whose records expire automatically.
///
/// The store is the single source of truth for revocation state across a
/// fleet; every process in front of it is a cache, never an authority.
/// Records are presence-only: the interesting fact is whether a key
/// exists, not what it maps to.
///
/// # Example Implementation
///
/// ```ignore
/// use fleetsync_storage::{TtlStore, StorageError};
///
/// struct InMemoryTtlStore {
///     entries: dashmap::DashMap<String, std::time::Instant>,
/// }
///
/// #[async_trait::async_trait]
/// impl TtlStore for InMemoryTtlStore {
///     async fn put(&self, key: &str, ttl_seconds: u64) -> Result<(), StorageError> {
///         let deadline = std::time::Instant::now()
///             + std::time::Duration::from_secs(ttl_seconds);
///         self.entries.insert(key.to_string(), deadline);
///         Ok(())
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Writes (or refreshes) a record that the backend deletes on its own
    /// once `ttl_seconds` have elapsed.
    ///
    /// Re-writing an existing key overwrites its TTL; the later write
    /// wins. A TTL of zero is legal and yields a record that is already
    /// due for expiry - backends must tolerate it rather than reject it.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn put(&self, key: &str, ttl_seconds: u64) -> Result<(), StorageError>;

    /// Checks whether a record currently exists for `key`.
    ///
    /// A record whose TTL has elapsed must report `false` even if the
    /// backend has not physically reclaimed it yet.
    ///
    /// # Errors
    ///
    /// Infrastructure failures surface as `Err`, never as `Ok(false)`.
    /// Conflating "store down" with "not present" would silently turn a
    /// revoked credential back into a valid one.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Physically reclaims expired records.
    ///
    /// Backends with a native TTL (Redis) implement this as a no-op;
    /// backends that expire lazily should sweep here. Returns the number
    /// of records reclaimed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn cleanup_expired(&self) -> Result<u64, StorageError>;
}

/// Atomic lease-based mutual exclusion with FIFO fairness.
///
/// At most one [`LeaseToken`] per name is live at a time, enforced by the
/// store, not by application-level coordination. A lease the holder never
/// releases is reclaimed by the store once its TTL elapses, bounding the
/// damage of a crashed holder.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Waits for the named lease, up to `wait_budget`.
    ///
    /// Among concurrent callers for the same name, grants are issued in
    /// arrival order; no caller is granted a second time while an
    /// earlier-arriving waiter remains unserved.
    ///
    /// Returns `Ok(Some(token))` on grant, or `Ok(None)` once the wait
    /// budget elapses. A waiter that gives up must not leave a dangling
    /// queue entry behind - later waiters may not be starved by it.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn acquire(
        &self,
        name: &str,
        lease_ttl: Duration,
        wait_budget: Duration,
    ) -> Result<Option<LeaseToken>, StorageError>;

    /// Releases a previously granted lease.
    ///
    /// Idempotent: releasing a token twice, or a token whose lease the
    /// store already reclaimed, succeeds without disturbing whoever holds
    /// the lease now.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn release(&self, token: &LeaseToken) -> Result<(), StorageError>;
}
