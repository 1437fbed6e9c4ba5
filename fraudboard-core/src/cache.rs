//! Single-slot time-to-live cache.
//!
//! Each query owns one `TtlCache`. A fresh entry is served as a shared
//! `Arc` without running the query. A stale or empty slot runs the query
//! outside the lock and then replaces the entry in one write; two concurrent
//! misses both run and the last one to finish wins. A fetch that started
//! before an `invalidate` returns its rows but does not store them.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

struct Entry<T> {
    stored_at: Instant,
    value: Arc<T>,
}

pub struct TtlCache<T> {
    name: &'static str,
    ttl: Duration,
    slot: RwLock<Option<Entry<T>>>,
    /// Bumped by `invalidate`, under the slot's write lock.
    generation: AtomicU64,
}

impl<T> TtlCache<T> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            slot: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value if it is younger than the TTL.
    pub async fn fresh(&self) -> Option<Arc<T>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Serve the fresh value or run `fetch` and store its result.
    ///
    /// A failed fetch leaves the slot untouched.
    pub async fn get_or_refresh<F, Fut, E>(&self, fetch: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.fresh().await {
            debug!(cache = self.name, "cache hit");
            return Ok(value);
        }

        debug!(cache = self.name, "cache miss, querying");
        let started = self.generation.load(Ordering::Acquire);
        let value = Arc::new(fetch().await?);

        let mut slot = self.slot.write().await;
        if self.generation.load(Ordering::Acquire) != started {
            debug!(cache = self.name, "invalidated during fetch, not storing");
            return Ok(value);
        }
        *slot = Some(Entry {
            stored_at: Instant::now(),
            value: Arc::clone(&value),
        });
        Ok(value)
    }

    /// Time since the current entry was stored.
    pub async fn age(&self) -> Option<Duration> {
        self.slot.read().await.as_ref().map(|e| e.stored_at.elapsed())
    }

    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        slot.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(600);

    async fn counted(calls: &AtomicUsize) -> Result<Vec<usize>, &'static str> {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(vec![n])
    }

    #[tokio::test(start_paused = true)]
    async fn hit_within_ttl_reuses_value() {
        let cache = TtlCache::new("test", TTL);
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_refresh(|| counted(&calls)).await.unwrap();
        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        let second = cache.get_or_refresh(|| counted(&calls)).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_refetched() {
        let cache = TtlCache::new("test", TTL);
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_refresh(|| counted(&calls)).await.unwrap();
        tokio::time::advance(TTL + Duration::from_millis(1)).await;
        let second = cache.get_or_refresh(|| counted(&calls)).await.unwrap();

        assert_eq!(*first, vec![1]);
        assert_eq!(*second, vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exactly_ttl_old_counts_as_stale() {
        let cache = TtlCache::new("test", TTL);
        let calls = AtomicUsize::new(0);

        cache.get_or_refresh(|| counted(&calls)).await.unwrap();
        tokio::time::advance(TTL).await;
        assert!(cache.fresh().await.is_none());
        cache.get_or_refresh(|| counted(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_slot_empty() {
        let cache: TtlCache<Vec<usize>> = TtlCache::new("test", TTL);

        let err = cache
            .get_or_refresh(|| async { Err::<Vec<usize>, _>("boom") })
            .await
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(cache.age().await.is_none());

        let calls = AtomicUsize::new(0);
        let value = cache.get_or_refresh(|| counted(&calls)).await.unwrap();
        assert_eq!(*value, vec![1]);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = TtlCache::new("test", TTL);
        let calls = AtomicUsize::new(0);

        cache.get_or_refresh(|| counted(&calls)).await.unwrap();
        cache.invalidate().await;
        let value = cache.get_or_refresh(|| counted(&calls)).await.unwrap();

        assert_eq!(*value, vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_overlapping_invalidate_is_not_stored() {
        let cache = Arc::new(TtlCache::new("test", TTL));
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let task = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .get_or_refresh(move || async move {
                        let _ = started_tx.send(());
                        let _ = release_rx.await;
                        Ok::<_, ()>("pre-refresh snapshot")
                    })
                    .await
            })
        };

        started_rx.await.unwrap();
        cache.invalidate().await;
        release_tx.send(()).unwrap();

        let value = task.await.unwrap().unwrap();
        assert_eq!(*value, "pre-refresh snapshot");

        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(cache.fresh().await.is_none());
        assert!(cache.age().await.is_none());

        let calls = AtomicUsize::new(0);
        let refreshed = cache
            .get_or_refresh(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>("post-refresh snapshot")
            })
            .await
            .unwrap();
        assert_eq!(*refreshed, "post-refresh snapshot");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_leave_one_whole_entry() {
        let cache = Arc::new(TtlCache::new("test", TTL));
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get_or_refresh(|| async {
                            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                            tokio::task::yield_now().await;
                            Ok::<_, ()>(vec![n; 64])
                        })
                        .await
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            let value = handle.await.expect("task panicked");
            assert!(value.iter().all(|n| *n == value[0]));
        }

        let stored = cache.fresh().await.expect("entry stored");
        assert_eq!(stored.len(), 64);
        assert!(stored.iter().all(|n| *n == stored[0]));
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }
}
