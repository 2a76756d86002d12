//! The object store abstraction every log operation persists through.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use mlog_types::ContentId;

use crate::error::{StoreError, StoreResult};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written: the same bytes always produce the
///   same ID.
/// - `put` is idempotent.
/// - Concurrent reads are always safe.
/// - The store never interprets object contents.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write bytes and return their content-addressed ID.
    async fn put(&self, data: Bytes) -> StoreResult<ContentId>;

    /// Read an object by its content-addressed ID.
    ///
    /// Returns [`StoreError::NotFound`] if the object does not exist.
    async fn get(&self, id: &ContentId) -> StoreResult<Bytes>;

    /// Check whether an object exists in the store.
    async fn has(&self, id: &ContentId) -> StoreResult<bool> {
        match self.get(id).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    async fn put(&self, data: Bytes) -> StoreResult<ContentId> {
        (**self).put(data).await
    }

    async fn get(&self, id: &ContentId) -> StoreResult<Bytes> {
        (**self).get(id).await
    }

    async fn has(&self, id: &ContentId) -> StoreResult<bool> {
        (**self).has(id).await
    }
}
