mod common;

use std::sync::Arc;
use std::time::Duration;

use common::tenant;
use futures::future::join_all;
use lighthouse_cache_service::{KeySpace, LeaseManager, LockName, MemoryBackend};

fn leases(backend: &MemoryBackend) -> LeaseManager {
    LeaseManager::new(Arc::new(backend.clone()), KeySpace::default())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_acquire_has_exactly_one_winner() {
    let backend = MemoryBackend::new();
    let manager = leases(&backend);
    let t = tenant("acme");

    for lock in [LockName::ScanProcessing, LockName::RecommendationsProcessing] {
        let racers = (0..16).map(|_| {
            let manager = manager.clone();
            let t = t.clone();
            tokio::spawn(async move { manager.acquire(&t, lock, Duration::from_secs(60)).await })
        });
        let results: Vec<bool> = join_all(racers).await.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(results.iter().filter(|won| **won).count(), 1, "lock {}", lock);
    }
}

#[tokio::test]
async fn release_allows_the_next_acquirer() {
    let backend = MemoryBackend::new();
    let manager = leases(&backend);
    let t = tenant("acme");

    assert!(manager.acquire(&t, LockName::ScanProcessing, Duration::from_secs(60)).await);
    assert!(manager.is_held(&t, LockName::ScanProcessing).await);
    assert!(!manager.acquire(&t, LockName::ScanProcessing, Duration::from_secs(60)).await);

    manager.release(&t, LockName::ScanProcessing).await;
    assert!(!manager.is_held(&t, LockName::ScanProcessing).await);
    assert!(manager.acquire(&t, LockName::ScanProcessing, Duration::from_secs(60)).await);
}

#[tokio::test]
async fn leases_are_scoped_per_tenant_and_name() {
    let backend = MemoryBackend::new();
    let manager = leases(&backend);

    assert!(manager.acquire(&tenant("a"), LockName::ScanProcessing, Duration::from_secs(60)).await);
    assert!(manager.acquire(&tenant("b"), LockName::ScanProcessing, Duration::from_secs(60)).await);
    assert!(manager.acquire(&tenant("a"), LockName::RecommendationsProcessing, Duration::from_secs(60)).await);
    assert!(backend.peek("_lighthouse:a:lock:scan-processing").is_some());
    assert!(backend.peek("_lighthouse:b:lock:scan-processing").is_some());
}

#[tokio::test(start_paused = true)]
async fn expired_lease_is_reclaimed() {
    let backend = MemoryBackend::new();
    let manager = leases(&backend);
    let t = tenant("acme");

    assert!(manager.acquire(&t, LockName::RecommendationsProcessing, Duration::from_secs(600)).await);
    tokio::time::advance(Duration::from_secs(599)).await;
    assert!(!manager.acquire(&t, LockName::RecommendationsProcessing, Duration::from_secs(600)).await);

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(!manager.is_held(&t, LockName::RecommendationsProcessing).await);
    assert!(manager.acquire(&t, LockName::RecommendationsProcessing, Duration::from_secs(600)).await);
}

#[tokio::test]
async fn backend_failure_fails_closed() {
    let backend = MemoryBackend::new();
    let manager = leases(&backend);
    let t = tenant("acme");

    backend.set_unavailable(true);
    assert!(!manager.acquire(&t, LockName::ScanProcessing, Duration::from_secs(60)).await);
    assert!(!manager.is_held(&t, LockName::ScanProcessing).await);
    // Release errors are swallowed
    manager.release(&t, LockName::ScanProcessing).await;
}
