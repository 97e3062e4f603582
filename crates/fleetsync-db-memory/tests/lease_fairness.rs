//! Fairness and crash-tolerance tests for the in-memory lease store.

use std::sync::Arc;
use std::time::Duration;

use fleetsync_db_memory::MemoryLeaseStore;
use fleetsync_storage::LeaseStore;
use tokio::sync::Mutex;

#[tokio::test]
async fn waiters_are_granted_in_arrival_order() {
    let store = Arc::new(MemoryLeaseStore::new());
    let order = Arc::new(Mutex::new(Vec::new()));

    let first = store
        .acquire("fifo", Duration::from_secs(30), Duration::from_secs(1))
        .await
        .unwrap()
        .unwrap();

    // Spawn A, B, C with staggered arrivals so their queue positions are
    // deterministic.
    let mut handles = Vec::new();
    for label in ["A", "B", "C"] {
        let store = Arc::clone(&store);
        let order = Arc::clone(&order);
        handles.push(tokio::spawn(async move {
            let token = store
                .acquire("fifo", Duration::from_secs(30), Duration::from_secs(10))
                .await
                .unwrap()
                .expect("waiter should eventually be granted");
            order.lock().await.push(label);
            store.release(&token).await.unwrap();
        }));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    store.release(&first).await.unwrap();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(*order.lock().await, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn expired_lease_is_handed_to_next_waiter() {
    let store = Arc::new(MemoryLeaseStore::new());

    // Holder "crashes": acquires with a short lease and never releases.
    let crashed = store
        .acquire("crash", Duration::from_millis(100), Duration::from_secs(1))
        .await
        .unwrap()
        .unwrap();

    let granted = store
        .acquire("crash", Duration::from_secs(30), Duration::from_secs(5))
        .await
        .unwrap()
        .expect("waiter should inherit the expired lease");
    assert_ne!(granted.id(), crashed.id());

    store.release(&granted).await.unwrap();
}

#[tokio::test]
async fn stale_token_release_does_not_disturb_new_holder() {
    let store = Arc::new(MemoryLeaseStore::new());

    let stale = store
        .acquire("job", Duration::from_millis(50), Duration::from_secs(1))
        .await
        .unwrap()
        .unwrap();

    // Wait past expiry so the store reclaims and reassigns the lease.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let current = store
        .acquire("job", Duration::from_secs(30), Duration::from_secs(1))
        .await
        .unwrap()
        .unwrap();

    // Releasing the stale token is a no-op for the current holder.
    store.release(&stale).await.unwrap();
    let denied = store
        .acquire("job", Duration::from_secs(30), Duration::from_millis(50))
        .await
        .unwrap();
    assert!(denied.is_none(), "current holder must still own the lease");

    store.release(&current).await.unwrap();
}

#[tokio::test]
async fn lapsed_lease_with_only_dead_waiters_is_granted_to_a_new_caller() {
    let store = Arc::new(MemoryLeaseStore::new());

    // Holder "crashes" with a short lease.
    let _crashed = store
        .acquire("lapsed", Duration::from_millis(100), Duration::from_secs(1))
        .await
        .unwrap()
        .unwrap();

    // Park a waiter, then cancel it so a closed grant channel stays in
    // the queue.
    let parked = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .acquire("lapsed", Duration::from_secs(30), Duration::from_secs(10))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    parked.abort();
    let _ = parked.await;

    // Block the (single) runtime thread past the lease deadline: the
    // reclaim task cannot run until this test yields again, so the next
    // acquire observes the lapsed holder and the dead queue entry itself.
    std::thread::sleep(Duration::from_millis(150));

    let granted = store
        .acquire("lapsed", Duration::from_secs(30), Duration::from_millis(10))
        .await
        .unwrap();
    let granted = granted.expect("free lease must be granted, not spuriously timed out");
    store.release(&granted).await.unwrap();
}

#[tokio::test]
async fn abandoned_waiter_leaves_no_dangling_queue_entry() {
    let store = Arc::new(MemoryLeaseStore::new());

    let held = store
        .acquire("queue", Duration::from_secs(30), Duration::from_secs(1))
        .await
        .unwrap()
        .unwrap();

    // This waiter gives up quickly.
    let abandoned = store
        .acquire("queue", Duration::from_secs(30), Duration::from_millis(50))
        .await
        .unwrap();
    assert!(abandoned.is_none());

    // A later waiter must not be starved by the abandoned entry.
    let waiter = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .acquire("queue", Duration::from_secs(30), Duration::from_secs(5))
                .await
                .unwrap()
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.release(&held).await.unwrap();

    let granted = waiter.await.unwrap();
    assert!(granted.is_some(), "later waiter should be granted promptly");
    store.release(&granted.unwrap()).await.unwrap();
}
