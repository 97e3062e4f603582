//! Credential revocation cache.
//!
//! Answers "is this credential currently revoked?" with minimum latency
//! and minimum load on the shared store, and publishes new revocations
//! with a correct expiry.
//!
//! # Design
//!
//! - The shared TTL store is the source of truth. Every process in the
//!   fleet keeps a small local cache in front of it.
//! - The local cache holds **positive results only**. "Not revoked" can
//!   change at any moment (another instance may revoke the same
//!   credential), so caching it would create stale false negatives.
//! - Local entries expire after a short, fixed window regardless of the
//!   remote TTL. Each process maintains its own cache; cross-instance
//!   consistency is bounded by that window, not by synchronization.
//! - Store outages surface as [`CoordError::StoreUnavailable`]. Silently
//!   answering `false` would be a security hole; silently answering
//!   `true` would be a denial of service. The caller decides.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use time::OffsetDateTime;
use tracing::debug;

use fleetsync_storage::TtlStore;

use crate::checksum::credential_checksum;
use crate::config::RevocationConfig;
use crate::credential::extract_expiry;
use crate::error::CoordError;

/// Probability (1/N) of sweeping stale local entries on insert at capacity.
const CLEANUP_PROBABILITY: u32 = 100; // 1% chance

/// Hard capacity multiplier - force eviction when exceeding this.
const HARD_CAPACITY_MULTIPLIER: f32 = 1.5;

/// A revocation published to the shared store.
///
/// The record carries no payload: its existence under the checksum key
/// is the fact. The store deletes it on its own once `ttl_seconds`
/// elapse; the application never deletes it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationRecord {
    /// Store key: SHA-256 checksum of the raw credential, never the
    /// credential itself.
    pub checksum: String,

    /// Remaining lifetime in seconds. Non-negative by construction; a
    /// credential already past its expiry yields zero.
    pub ttl_seconds: u64,
}

impl RevocationRecord {
    /// Builds the record for a credential expiring at `expiry`.
    ///
    /// The TTL is `seconds_until(expiry) + grace`, clamped at zero. The
    /// grace period keeps the record alive slightly past the
    /// credential's own lifetime to absorb clock skew between services.
    #[must_use]
    pub fn for_expiry(
        checksum: String,
        expiry: OffsetDateTime,
        grace: std::time::Duration,
        now: OffsetDateTime,
    ) -> Self {
        let seconds_until_expiry = (expiry - now).whole_seconds();
        let ttl = seconds_until_expiry.saturating_add(grace.as_secs() as i64);
        Self {
            checksum,
            ttl_seconds: u64::try_from(ttl).unwrap_or(0),
        }
    }
}

/// Statistics for the process-local positive cache.
#[derive(Debug, Default)]
struct LocalCacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

/// A point-in-time snapshot of local cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalCacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

/// Revocation cache over a shared TTL store.
///
/// Thread-safe; `revoke` and `is_revoked` may be called concurrently
/// from any number of tasks. Two tasks racing to cache "revoked" for the
/// same checksum is harmless - the write is idempotent.
pub struct RevocationCache<S: TtlStore + ?Sized> {
    store: Arc<S>,
    config: RevocationConfig,
    /// checksum -> time the positive entry was cached. Positive entries
    /// only; absence means "ask the store".
    local: DashMap<String, Instant>,
    stats: LocalCacheStats,
}

impl<S: TtlStore + ?Sized> RevocationCache<S> {
    /// Creates a cache with default configuration.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, RevocationConfig::default())
    }

    /// Creates a cache with the given configuration.
    #[must_use]
    pub fn with_config(store: Arc<S>, config: RevocationConfig) -> Self {
        Self {
            store,
            local: DashMap::with_capacity(config.local_cache_capacity.min(1024)),
            config,
            stats: LocalCacheStats::default(),
        }
    }

    /// Revokes a credential before its natural expiry.
    ///
    /// Parses the credential's expiration claim (parsing only, never
    /// signature validation), publishes a revocation record that the
    /// store expires `grace_period` after the credential would have
    /// expired anyway, and primes the local cache so this instance never
    /// misses its own write.
    ///
    /// Re-revoking the same credential simply reasserts the record; the
    /// later write wins, which is fine because a credential has one
    /// canonical expiry.
    ///
    /// # Errors
    ///
    /// - [`CoordError::InvalidArgument`] - blank credential, no I/O done.
    /// - [`CoordError::MalformedCredential`] - expiry cannot be
    ///   determined, no store write performed.
    /// - [`CoordError::StoreUnavailable`] - the store write failed.
    pub async fn revoke(&self, raw_credential: &str) -> Result<(), CoordError> {
        if raw_credential.trim().is_empty() {
            return Err(CoordError::invalid_argument(
                "credential must not be blank",
            ));
        }

        let expiry = extract_expiry(raw_credential)?;
        let record = RevocationRecord::for_expiry(
            credential_checksum(raw_credential),
            expiry,
            self.config.grace_period,
            OffsetDateTime::now_utc(),
        );

        self.store.put(&record.checksum, record.ttl_seconds).await?;
        debug!(ttl_seconds = record.ttl_seconds, "revocation published");

        // Write-through: the instance that issued the revocation must
        // see it immediately, without a store round trip.
        self.cache_positive(record.checksum);
        Ok(())
    }

    /// Checks whether a credential has been revoked.
    ///
    /// The local positive cache is consulted first; a fresh hit answers
    /// `true` without touching the store. On a miss the store's
    /// existence check decides: `true` is cached locally, `false` is
    /// returned but never cached.
    ///
    /// # Errors
    ///
    /// - [`CoordError::InvalidArgument`] - blank credential, no I/O done.
    /// - [`CoordError::StoreUnavailable`] - the store could not answer.
    ///   Never masked as `false`.
    pub async fn is_revoked(&self, raw_credential: &str) -> Result<bool, CoordError> {
        if raw_credential.trim().is_empty() {
            return Err(CoordError::invalid_argument(
                "credential must not be blank",
            ));
        }

        let checksum = credential_checksum(raw_credential);

        if self.local_hit(&checksum) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(true);
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        if self.store.exists(&checksum).await? {
            self.cache_positive(checksum);
            return Ok(true);
        }

        // Negative results are never cached: another instance may revoke
        // this credential at any moment.
        Ok(false)
    }

    /// Returns the number of local positive entries, including stale
    /// ones not yet evicted.
    #[must_use]
    pub fn local_cache_len(&self) -> usize {
        self.local.len()
    }

    /// Returns a snapshot of local cache statistics.
    #[must_use]
    pub fn local_cache_stats(&self) -> LocalCacheStatsSnapshot {
        LocalCacheStatsSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            insertions: self.stats.insertions.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
        }
    }

    /// Checks the local cache for a fresh positive entry, evicting a
    /// stale one on the way.
    fn local_hit(&self, checksum: &str) -> bool {
        if let Some(cached_at) = self.local.get(checksum) {
            if cached_at.elapsed() <= self.config.local_cache_ttl {
                return true;
            }
            drop(cached_at); // release the shard lock before removing
            self.local.remove(checksum);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
        false
    }

    /// Records a positive entry, keeping the cache bounded.
    ///
    /// At capacity, stale entries are swept probabilistically (1% of
    /// inserts) so the cost amortizes; past the hard limit the sweep is
    /// forced and, if still over, the oldest entries are evicted.
    fn cache_positive(&self, checksum: String) {
        let capacity = self.config.local_cache_capacity;
        let current_len = self.local.len();
        let hard_limit = (capacity as f32 * HARD_CAPACITY_MULTIPLIER) as usize;

        if current_len >= capacity {
            let should_cleanup = fastrand::u32(0..CLEANUP_PROBABILITY) == 0;
            if should_cleanup || current_len >= hard_limit {
                self.cleanup_stale();
            }
            let len_after = self.local.len();
            if len_after >= hard_limit {
                self.evict_oldest(len_after + 1 - capacity);
            }
        }

        self.local.insert(checksum, Instant::now());
        self.stats.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Removes entries older than the local TTL.
    fn cleanup_stale(&self) {
        let ttl = self.config.local_cache_ttl;
        let before = self.local.len();
        self.local.retain(|_, cached_at| cached_at.elapsed() <= ttl);
        let removed = before.saturating_sub(self.local.len());
        if removed > 0 {
            self.stats
                .evictions
                .fetch_add(removed as u64, Ordering::Relaxed);
        }
    }

    /// Evicts the `count` oldest entries outright.
    fn evict_oldest(&self, count: usize) {
        let mut entries: Vec<(String, Instant)> = self
            .local
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort_by_key(|(_, cached_at)| *cached_at);

        for (key, _) in entries.into_iter().take(count) {
            self.local.remove(&key);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl<S: TtlStore + ?Sized> std::fmt::Debug for RevocationCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationCache")
            .field("local_cache_len", &self.local.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use time::macros::datetime;

    #[test]
    fn test_ttl_is_time_to_expiry_plus_grace() {
        let now = datetime!(2025-01-01 00:00:00 UTC);
        let expiry = now + Duration::from_secs(300);
        let record = RevocationRecord::for_expiry(
            "abc".to_string(),
            expiry,
            Duration::from_secs(60),
            now,
        );
        assert_eq!(record.ttl_seconds, 360);
    }

    #[test]
    fn test_ttl_never_negative_for_expired_credential() {
        let now = datetime!(2025-01-01 00:00:00 UTC);
        let expiry = now - Duration::from_secs(3600);
        let record =
            RevocationRecord::for_expiry("abc".to_string(), expiry, Duration::from_secs(60), now);
        assert_eq!(record.ttl_seconds, 0);
    }

    #[test]
    fn test_grace_keeps_barely_expired_credential_alive() {
        let now = datetime!(2025-01-01 00:00:00 UTC);
        let expiry = now - Duration::from_secs(30);
        let record =
            RevocationRecord::for_expiry("abc".to_string(), expiry, Duration::from_secs(60), now);
        assert_eq!(record.ttl_seconds, 30);
    }
}
