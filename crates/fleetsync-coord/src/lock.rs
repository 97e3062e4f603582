//! Distributed exclusive lock.
//!
//! Runs a caller-supplied unit of work such that, across the whole
//! fleet, at most one instance executes it for a given lock name at a
//! time. Mutual exclusion is enforced by the shared store's lease
//! primitive; this module adds the acquire/run/release discipline on
//! top of it.
//!
//! The correctness core is guaranteed release: the lease is released
//! exactly once on every exit path of the work - normal completion,
//! an application-level error value, or a panic (best effort, with the
//! server-side lease TTL as the second line of defense for a process
//! that dies mid-critical-section).

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use fleetsync_storage::{LeaseStore, LeaseToken};

use crate::config::LockConfig;
use crate::error::CoordError;

/// Distributed exclusive lock over a lease store.
///
/// Cloneable handle; all clones share the same backing store. Acquiring
/// a contested lock blocks the calling task for up to the wait budget -
/// callers that must stay responsive should run it on a dedicated task.
pub struct DistributedLock<S: LeaseStore + ?Sized + 'static> {
    store: Arc<S>,
    config: LockConfig,
}

impl<S: LeaseStore + ?Sized + 'static> Clone for DistributedLock<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: LeaseStore + ?Sized + 'static> DistributedLock<S> {
    /// Creates a lock service with default configuration.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, LockConfig::default())
    }

    /// Creates a lock service with the given configuration.
    #[must_use]
    pub fn with_config(store: Arc<S>, config: LockConfig) -> Self {
        Self { store, config }
    }

    /// Runs `work` under the named exclusive lease, waiting up to the
    /// configured default budget for the grant.
    ///
    /// See [`try_with_exclusive_lock`](Self::try_with_exclusive_lock).
    ///
    /// # Errors
    ///
    /// Returns `CoordError::LockTimeout` if the lease is not granted
    /// within the default wait budget; `work` is never invoked in that
    /// case.
    pub async fn with_exclusive_lock<T, F, Fut>(
        &self,
        name: &str,
        lease_ttl: Duration,
        work: F,
    ) -> Result<T, CoordError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.try_with_exclusive_lock(name, lease_ttl, self.config.default_wait_budget, work)
            .await
    }

    /// Runs `work` under the named exclusive lease with an explicit wait
    /// budget.
    ///
    /// Acquisition blocks until the lease is granted (FIFO-fair among
    /// concurrent waiters for the same name, per the store contract) or
    /// the wait budget elapses. `lease_ttl` bounds how long the lease is
    /// honored if this process dies without releasing.
    ///
    /// The work's output passes through untouched after release. When
    /// the work itself produces a `Result`, its `Err` comes back to the
    /// caller unchanged - the lease is still released first.
    ///
    /// # Errors
    ///
    /// - `CoordError::InvalidArgument` - blank name or zero lease TTL.
    /// - `CoordError::LockTimeout` - grant did not arrive within
    ///   `wait_budget`; `work` never ran.
    /// - `CoordError::StoreUnavailable` - the lease store failed.
    pub async fn try_with_exclusive_lock<T, F, Fut>(
        &self,
        name: &str,
        lease_ttl: Duration,
        wait_budget: Duration,
        work: F,
    ) -> Result<T, CoordError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if name.trim().is_empty() {
            return Err(CoordError::invalid_argument("lock name must not be blank"));
        }
        if lease_ttl.is_zero() {
            return Err(CoordError::invalid_argument("lease ttl must be positive"));
        }

        let token = self
            .store
            .acquire(name, lease_ttl, wait_budget)
            .await?
            .ok_or_else(|| CoordError::lock_timeout(name, wait_budget))?;
        debug!(lock = %name, token = %token.id(), "exclusive lease granted");

        let mut guard = LeaseGuard {
            store: Arc::clone(&self.store),
            token: Some(token),
        };

        let result = work().await;
        guard.release().await;
        Ok(result)
    }
}

impl<S: LeaseStore + ?Sized + 'static> std::fmt::Debug for DistributedLock<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedLock")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Scoped ownership of a granted lease.
///
/// Normal flow releases explicitly after the work completes. If the
/// work panics, `Drop` spawns a best-effort release so the lease is not
/// held until its TTL; the server-side TTL remains the backstop if even
/// that cannot run.
struct LeaseGuard<S: LeaseStore + ?Sized + 'static> {
    store: Arc<S>,
    token: Option<LeaseToken>,
}

impl<S: LeaseStore + ?Sized + 'static> LeaseGuard<S> {
    /// Releases the lease, at most once.
    ///
    /// Release failures are logged and swallowed: the token may already
    /// have been reclaimed server-side, and the TTL guarantees the lease
    /// cannot outlive its bound either way. Surfacing the failure would
    /// mask the work's own outcome.
    async fn release(&mut self) {
        if let Some(token) = self.token.take() {
            if let Err(err) = self.store.release(&token).await {
                warn!(
                    lock = %token.name(),
                    error = %err,
                    "failed to release lease, server-side expiry will reclaim it"
                );
            } else {
                debug!(lock = %token.name(), token = %token.id(), "exclusive lease released");
            }
        }
    }
}

impl<S: LeaseStore + ?Sized + 'static> Drop for LeaseGuard<S> {
    fn drop(&mut self) {
        // Only reachable when the work unwound; the normal path already
        // took the token in release().
        if let Some(token) = self.token.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let store = Arc::clone(&self.store);
                handle.spawn(async move {
                    let _ = store.release(&token).await;
                });
            }
        }
    }
}
