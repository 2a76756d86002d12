//! In-memory object store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use mlog_types::ContentId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. All objects are held in memory behind a
/// `RwLock` for safe concurrent access. Reads hand out cheap [`Bytes`] clones.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ContentId, Bytes>>,
    read_only: AtomicBool,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            read_only: AtomicBool::new(false),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Reject all further writes with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Remove an object. Returns `true` if it existed.
    ///
    /// Only meant for simulating objects that never replicated to this node.
    pub fn remove(&self, id: &ContentId) -> bool {
        self.objects
            .write()
            .expect("lock poisoned")
            .remove(id)
            .is_some()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, data: Bytes) -> StoreResult<ContentId> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        let id = ContentHasher::OBJECT.hash(&data);
        let mut map = self.objects.write().expect("lock poisoned");
        // Same ID always maps to the same content, so an existing entry stays.
        map.entry(id).or_insert(data);
        debug!(id = %id.short_hex(), "stored object");
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> StoreResult<Bytes> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }

    async fn has(&self, id: &ContentId) -> StoreResult<bool> {
        Ok(self.objects.read().expect("lock poisoned").contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_and_get() {
        let store = InMemoryObjectStore::new();
        let id = store.put(Bytes::from_static(b"hello world")).await.unwrap();
        assert_eq!(id, ContentHasher::OBJECT.hash(b"hello world"));

        let read_back = store.get(&id).await.unwrap();
        assert_eq!(&read_back[..], b"hello world");
    }

    #[tokio::test]
    async fn same_content_produces_same_id() {
        let store = InMemoryObjectStore::new();
        let id1 = store.put(Bytes::from_static(b"identical")).await.unwrap();
        let id2 = store.put(Bytes::from_static(b"identical")).await.unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn different_content_produces_different_ids() {
        let store = InMemoryObjectStore::new();
        let id1 = store.put(Bytes::from_static(b"aaa")).await.unwrap();
        let id2 = store.put(Bytes::from_static(b"bbb")).await.unwrap();
        assert_ne!(id1, id2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn get_missing_object_is_not_found() {
        let store = InMemoryObjectStore::new();
        let id = ContentId::from_bytes(b"missing");
        assert!(matches!(store.get(&id).await, Err(StoreError::NotFound(m)) if m == id));
        assert!(!store.has(&id).await.unwrap());
    }

    #[tokio::test]
    async fn read_only_rejects_writes() {
        let store = InMemoryObjectStore::new();
        store.set_read_only(true);
        let result = store.put(Bytes::from_static(b"nope")).await;
        assert!(matches!(result, Err(StoreError::ReadOnly)));
        assert!(store.is_empty());

        store.set_read_only(false);
        assert!(store.put(Bytes::from_static(b"yes")).await.is_ok());
    }

    #[tokio::test]
    async fn remove_makes_object_unreachable() {
        let store = InMemoryObjectStore::new();
        let id = store.put(Bytes::from_static(b"gone")).await.unwrap();
        assert!(store.remove(&id));
        assert!(!store.has(&id).await.unwrap());
        assert!(!store.remove(&id));
    }
}
