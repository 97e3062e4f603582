//! In-memory FIFO-fair lease store.
//!
//! Each lock name owns a small state machine: the current holder (if
//! any) plus a FIFO queue of waiters. Grants are handed out strictly in
//! arrival order. Every grant schedules an expiry task that reclaims the
//! lease at its deadline if the holder never released it, so a crashed
//! holder cannot wedge the queue.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, oneshot};
use tracing::debug;
use uuid::Uuid;

use fleetsync_storage::{LeaseStore, LeaseToken, StorageError};

/// The current holder of a lease.
struct HeldLease {
    token_id: Uuid,
    expires_at: Instant,
}

/// A parked acquire call. The waiter mints its own token up front; the
/// queue only signals the grant, so a grant that races with the waiter's
/// timeout is always attributable to a known token id.
struct Waiter {
    id: u64,
    token_id: Uuid,
    lease_ttl: Duration,
    grant_tx: oneshot::Sender<()>,
}

#[derive(Default)]
struct LeaseState {
    holder: Option<HeldLease>,
    queue: VecDeque<Waiter>,
}

#[derive(Default)]
struct Inner {
    locks: Mutex<HashMap<String, LeaseState>>,
}

/// In-memory implementation of [`LeaseStore`].
#[derive(Default)]
pub struct MemoryLeaseStore {
    inner: Arc<Inner>,
    waiter_seq: AtomicU64,
}

impl MemoryLeaseStore {
    /// Creates an empty lease store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands the lease to the earliest waiter still listening.
    ///
    /// Waiters whose grant channel is already closed gave up; they are
    /// skipped so they cannot starve the rest of the queue.
    fn grant_next(inner: &Arc<Inner>, name: &str, state: &mut LeaseState) {
        while let Some(waiter) = state.queue.pop_front() {
            if waiter.grant_tx.send(()).is_err() {
                continue;
            }
            state.holder = Some(HeldLease {
                token_id: waiter.token_id,
                expires_at: Instant::now() + waiter.lease_ttl,
            });
            Self::spawn_expiry(inner, name, waiter.token_id, waiter.lease_ttl);
            return;
        }
    }

    /// Schedules server-side reclamation of a grant at its deadline.
    ///
    /// Token ids are unique per grant, so the task is a no-op whenever
    /// the lease was released (or reassigned) in the meantime.
    fn spawn_expiry(inner: &Arc<Inner>, name: &str, token_id: Uuid, lease_ttl: Duration) {
        let inner = Arc::clone(inner);
        let name = name.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(lease_ttl).await;
            let mut locks = inner.locks.lock().await;
            if let Some(state) = locks.get_mut(&name) {
                if state
                    .holder
                    .as_ref()
                    .is_some_and(|held| held.token_id == token_id)
                {
                    debug!(lock = %name, "lease expired without release, reclaiming");
                    state.holder = None;
                    Self::grant_next(&inner, &name, state);
                }
            }
            gc_if_idle(&mut locks, &name);
        });
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn acquire(
        &self,
        name: &str,
        lease_ttl: Duration,
        wait_budget: Duration,
    ) -> Result<Option<LeaseToken>, StorageError> {
        let token = LeaseToken::new(name);
        let waiter_id = self.waiter_seq.fetch_add(1, Ordering::SeqCst);

        let grant_rx = {
            let mut locks = self.inner.locks.lock().await;
            let state = locks.entry(name.to_string()).or_default();

            // Reclaim a lapsed holder eagerly; the expiry task for it may
            // not have fired yet.
            if state
                .holder
                .as_ref()
                .is_some_and(|held| Instant::now() >= held.expires_at)
            {
                state.holder = None;
            }

            if state.holder.is_none() && state.queue.is_empty() {
                state.holder = Some(HeldLease {
                    token_id: token.id(),
                    expires_at: Instant::now() + lease_ttl,
                });
                Self::spawn_expiry(&self.inner, name, token.id(), lease_ttl);
                debug!(lock = %name, token = %token.id(), "lease granted immediately");
                return Ok(Some(token));
            }

            // Earlier arrivals go first.
            if state.holder.is_none() {
                Self::grant_next(&self.inner, name, state);

                // Every queued waiter may have given up, leaving the
                // lease free with nobody left to grant it to. Take it
                // instead of parking behind an empty queue.
                if state.holder.is_none() && state.queue.is_empty() {
                    state.holder = Some(HeldLease {
                        token_id: token.id(),
                        expires_at: Instant::now() + lease_ttl,
                    });
                    Self::spawn_expiry(&self.inner, name, token.id(), lease_ttl);
                    debug!(lock = %name, token = %token.id(), "lease granted immediately");
                    return Ok(Some(token));
                }
            }

            let (grant_tx, grant_rx) = oneshot::channel();
            state.queue.push_back(Waiter {
                id: waiter_id,
                token_id: token.id(),
                lease_ttl,
                grant_tx,
            });
            grant_rx
        };

        match tokio::time::timeout(wait_budget, grant_rx).await {
            Ok(Ok(())) => {
                debug!(lock = %name, token = %token.id(), "lease granted after wait");
                Ok(Some(token))
            }
            Ok(Err(_)) => Err(StorageError::internal(
                "lease queue dropped its grant channel",
            )),
            Err(_) => {
                let mut locks = self.inner.locks.lock().await;
                if let Some(state) = locks.get_mut(name) {
                    if let Some(pos) = state.queue.iter().position(|w| w.id == waiter_id) {
                        state.queue.remove(pos);
                    } else if state
                        .holder
                        .as_ref()
                        .is_some_and(|held| held.token_id == token.id())
                    {
                        // The grant raced with our timeout; hand the lease
                        // straight to the next waiter.
                        state.holder = None;
                        Self::grant_next(&self.inner, name, state);
                    }
                }
                gc_if_idle(&mut locks, name);
                debug!(lock = %name, "wait budget elapsed before grant");
                Ok(None)
            }
        }
    }

    async fn release(&self, token: &LeaseToken) -> Result<(), StorageError> {
        let mut locks = self.inner.locks.lock().await;
        if let Some(state) = locks.get_mut(token.name()) {
            if state
                .holder
                .as_ref()
                .is_some_and(|held| held.token_id == token.id())
            {
                state.holder = None;
                Self::grant_next(&self.inner, token.name(), state);
                debug!(lock = %token.name(), token = %token.id(), "lease released");
            }
            // Stale or already-released tokens fall through: release is
            // idempotent and never disturbs the current holder.
        }
        gc_if_idle(&mut locks, token.name());
        Ok(())
    }
}

/// Drops the per-name state once nobody holds or waits on it.
fn gc_if_idle(locks: &mut HashMap<String, LeaseState>, name: &str) {
    if locks
        .get(name)
        .is_some_and(|state| state.holder.is_none() && state.queue.is_empty())
    {
        locks.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_immediate_grant_when_uncontended() {
        let store = MemoryLeaseStore::new();
        let token = store
            .acquire("job", Duration::from_secs(30), Duration::from_secs(1))
            .await
            .unwrap()
            .expect("uncontended acquire should grant");
        assert_eq!(token.name(), "job");
        store.release(&token).await.unwrap();
    }

    #[tokio::test]
    async fn test_second_acquire_times_out_while_held() {
        let store = MemoryLeaseStore::new();
        let held = store
            .acquire("job", Duration::from_secs(30), Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();

        let denied = store
            .acquire("job", Duration::from_secs(30), Duration::from_millis(50))
            .await
            .unwrap();
        assert!(denied.is_none());

        store.release(&held).await.unwrap();
    }

    #[tokio::test]
    async fn test_release_hands_over_to_waiter() {
        let store = Arc::new(MemoryLeaseStore::new());
        let held = store
            .acquire("job", Duration::from_secs(30), Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .acquire("job", Duration::from_secs(30), Duration::from_secs(5))
                    .await
                    .unwrap()
            })
        };

        // Let the waiter park before releasing.
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.release(&held).await.unwrap();

        let granted = waiter.await.unwrap().expect("waiter should be granted");
        assert_ne!(granted.id(), held.id());
        store.release(&granted).await.unwrap();
    }

    #[tokio::test]
    async fn test_double_release_is_idempotent() {
        let store = MemoryLeaseStore::new();
        let token = store
            .acquire("job", Duration::from_secs(30), Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();
        store.release(&token).await.unwrap();
        store.release(&token).await.unwrap();
    }
}
