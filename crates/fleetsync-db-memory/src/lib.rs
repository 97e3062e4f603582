//! In-memory store backend for fleetsync.
//!
//! This crate provides in-memory implementations of the `TtlStore` and
//! `LeaseStore` contracts from `fleetsync-storage`. The backend is a
//! compliant single-process store: the revocation and lock integration
//! tests run against it, and it doubles as a real backend for
//! single-node deployments that only need intra-process coordination.
//!
//! # Example
//!
//! ```ignore
//! use fleetsync_db_memory::{MemoryLeaseStore, MemoryTtlStore};
//! use fleetsync_storage::{LeaseStore, TtlStore};
//!
//! let store = MemoryTtlStore::new();
//! store.put("abc123", 360).await?;
//! assert!(store.exists("abc123").await?);
//! ```

pub mod lease;
pub mod ttl;

// Re-export the contracts for convenience
pub use fleetsync_storage::{LeaseStore, LeaseToken, StorageError, TtlStore};

pub use lease::MemoryLeaseStore;
pub use ttl::MemoryTtlStore;
