//! # fleetsync-coord
//!
//! Coordination primitives for fleets of stateless service instances,
//! built over a shared TTL-capable key-value store.
//!
//! This crate provides:
//! - A credential [`RevocationCache`]: local positive-only cache in
//!   front of the shared store, answering "has this credential been
//!   revoked before its natural expiry?" cheaply and consistently
//!   (within a bounded staleness window) across the fleet.
//! - A [`DistributedLock`]: FIFO-fair, lease-based mutual exclusion with
//!   guaranteed release for arbitrary caller-supplied critical sections.
//!
//! Both primitives derive their truth from the same shared store (see
//! `fleetsync-storage` for the contracts), so every instance converges
//! on the same answer without a central coordinator process.
//!
//! This is not a consensus protocol and provides no exactly-once
//! guarantees: it offers best-effort, TTL-bounded consistency suitable
//! for authentication gating and coarse-grained mutual exclusion.
//!
//! ## Modules
//!
//! - [`config`] - Coordination configuration
//! - [`checksum`] - Store-key derivation from raw credentials
//! - [`credential`] - Expiry extraction from claims-bearing tokens
//! - [`revocation`] - The revocation cache
//! - [`lock`] - The distributed exclusive lock

pub mod checksum;
pub mod config;
pub mod credential;
pub mod error;
pub mod lock;
pub mod revocation;

pub use checksum::credential_checksum;
pub use config::{ConfigError, CoordConfig, LockConfig, RevocationConfig};
pub use error::{CoordError, ErrorCategory};
pub use lock::DistributedLock;
pub use revocation::{LocalCacheStatsSnapshot, RevocationCache, RevocationRecord};

// Re-export the store contracts so callers can depend on one crate.
pub use fleetsync_storage::{LeaseStore, LeaseToken, StorageError, TtlStore};

/// Type alias for coordination results.
pub type CoordResult<T> = Result<T, CoordError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use fleetsync_coord::prelude::*;
/// ```
pub mod prelude {
    pub use crate::CoordResult;
    pub use crate::config::{ConfigError, CoordConfig, LockConfig, RevocationConfig};
    pub use crate::error::{CoordError, ErrorCategory};
    pub use crate::lock::DistributedLock;
    pub use crate::revocation::{RevocationCache, RevocationRecord};
    pub use fleetsync_storage::{LeaseStore, LeaseToken, TtlStore};
}
