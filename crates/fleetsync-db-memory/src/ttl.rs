//! In-memory TTL key-value store using DashMap.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use fleetsync_storage::{StorageError, TtlStore};

/// In-memory implementation of [`TtlStore`].
///
/// Each key maps to its expiry deadline. Expiry is lazy: a lapsed record
/// reports "not present" immediately and is physically removed on the
/// next read that touches it or by [`cleanup_expired`](TtlStore::cleanup_expired).
#[derive(Debug, Default)]
pub struct MemoryTtlStore {
    entries: DashMap<String, Instant>,
}

impl MemoryTtlStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records, including lapsed ones not yet reclaimed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TtlStore for MemoryTtlStore {
    async fn put(&self, key: &str, ttl_seconds: u64) -> Result<(), StorageError> {
        let deadline = Instant::now()
            .checked_add(Duration::from_secs(ttl_seconds))
            .ok_or_else(|| StorageError::internal("ttl overflows the clock"))?;
        self.entries.insert(key.to_string(), deadline);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        if let Some(deadline) = self.entries.get(key) {
            if Instant::now() < *deadline {
                return Ok(true);
            }
            drop(deadline); // release the shard lock before removing
            self.entries.remove(key);
        }
        Ok(false)
    }

    async fn cleanup_expired(&self) -> Result<u64, StorageError> {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, deadline| now < *deadline);
        Ok((before - self.entries.len()) as u64)
    }
}
