//! An [`ObjectStore`] wrapper that adds IO latency and unreachable objects.
//!
//! `LatencyStore` wraps any `Arc<dyn ObjectStore>`, sleeps before each read or
//! write, and can "stall" individual objects so that reading them never
//! completes. It also counts reads, which lets tests assert that cached
//! entries are not fetched twice.
//!
//! # Example
//!
//! ```ignore
//! let slow = LatencyStore::new(inner)
//!     .read_latency(Duration::from_millis(5))
//!     .write_latency(Duration::from_millis(10));
//! slow.stall(missing_id);
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use mlog_types::ContentId;
use tracing::debug;

use crate::error::StoreResult;
use crate::traits::ObjectStore;

/// A [`ObjectStore`] wrapper that injects latency before IO operations.
pub struct LatencyStore {
    inner: Arc<dyn ObjectStore>,
    read_latency: Duration,
    write_latency: Duration,
    stalled: RwLock<HashSet<ContentId>>,
    reads: AtomicUsize,
}

impl LatencyStore {
    /// Wrap an existing store with zero latency (pass-through) by default.
    pub fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self {
            inner,
            read_latency: Duration::ZERO,
            write_latency: Duration::ZERO,
            stalled: RwLock::new(HashSet::new()),
            reads: AtomicUsize::new(0),
        }
    }

    /// Set the delay applied before every read.
    pub fn read_latency(mut self, latency: Duration) -> Self {
        self.read_latency = latency;
        self
    }

    /// Set the delay applied before every write.
    pub fn write_latency(mut self, latency: Duration) -> Self {
        self.write_latency = latency;
        self
    }

    /// Make reads of `id` hang forever.
    pub fn stall(&self, id: ContentId) {
        self.stalled.write().expect("lock poisoned").insert(id);
    }

    /// Make `id` readable again.
    pub fn unstall(&self, id: &ContentId) {
        self.stalled.write().expect("lock poisoned").remove(id);
    }

    /// Number of `get` calls served so far (including stalled ones).
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn is_stalled(&self, id: &ContentId) -> bool {
        self.stalled.read().expect("lock poisoned").contains(id)
    }
}

#[async_trait]
impl ObjectStore for LatencyStore {
    async fn put(&self, data: Bytes) -> StoreResult<ContentId> {
        if !self.write_latency.is_zero() {
            tokio::time::sleep(self.write_latency).await;
        }
        self.inner.put(data).await
    }

    async fn get(&self, id: &ContentId) -> StoreResult<Bytes> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.is_stalled(id) {
            debug!(id = %id.short_hex(), "read stalled");
            std::future::pending::<()>().await;
        }
        if !self.read_latency.is_zero() {
            tokio::time::sleep(self.read_latency).await;
        }
        self.inner.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryObjectStore;

    fn wrapped() -> LatencyStore {
        LatencyStore::new(Arc::new(InMemoryObjectStore::new()))
    }

    #[tokio::test]
    async fn passes_through_reads_and_writes() {
        let store = wrapped();
        let id = store.put(Bytes::from_static(b"data")).await.unwrap();
        assert_eq!(&store.get(&id).await.unwrap()[..], b"data");
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn read_latency_delays_reads() {
        let store = wrapped().read_latency(Duration::from_millis(20));
        let id = store.put(Bytes::from_static(b"slow")).await.unwrap();

        let started = std::time::Instant::now();
        store.get(&id).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn stalled_reads_never_complete() {
        let store = wrapped();
        let id = store.put(Bytes::from_static(b"stuck")).await.unwrap();
        store.stall(id);

        let result = tokio::time::timeout(Duration::from_millis(50), store.get(&id)).await;
        assert!(result.is_err());

        store.unstall(&id);
        assert!(store.get(&id).await.is_ok());
        assert_eq!(store.reads(), 2);
    }
}
