//! A single node of the log graph.
//!
//! Entries are persisted as a JSON record `{id, payload, next, clock, version}`.
//! The entry's `hash` is not part of the record: it is the identifier the
//! store returns for the record bytes, so it is a pure function of all the
//! other fields.

use std::cmp::Ordering;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use mlog_store::ObjectStore;
use mlog_types::{ContentId, LamportClock, LogId};

use crate::error::{DagError, DagResult};

/// Schema version written into new entry records.
pub const ENTRY_VERSION: u32 = 1;

/// An immutable, content-addressed log entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Identifier of the stored record.
    pub hash: ContentId,
    /// Id of the log this entry was appended to.
    pub id: LogId,
    /// Opaque user payload.
    pub payload: Value,
    /// Hashes of the immediate causal predecessors.
    pub next: Vec<ContentId>,
    /// Clock of the writing log at the time of the append.
    pub clock: LamportClock,
    /// Record schema version.
    pub version: u32,
}

/// Borrowed view of the persisted fields, used for encoding without clones.
#[derive(Serialize)]
struct EntryRecord<'a> {
    id: &'a LogId,
    payload: &'a Value,
    next: &'a [ContentId],
    clock: &'a LamportClock,
    version: u32,
}

/// Owned form of a record read back from the store.
#[derive(Deserialize)]
struct StoredEntry {
    id: LogId,
    payload: Value,
    next: Vec<ContentId>,
    clock: LamportClock,
    version: u32,
}

impl Entry {
    /// Create, persist and return a new entry with the current schema version.
    ///
    /// See [`create_with_version`](Self::create_with_version).
    pub async fn create<S>(
        store: &S,
        log_id: &LogId,
        clock: Option<&LamportClock>,
        payload: Value,
        parents: &[Arc<Entry>],
    ) -> DagResult<Entry>
    where
        S: ObjectStore + ?Sized,
    {
        Self::create_with_version(store, log_id, clock, payload, parents, ENTRY_VERSION).await
    }

    /// Create, persist and return a new entry.
    ///
    /// The entry's clock is `clock.tick()` when a clock is given, otherwise a
    /// fresh clock for `log_id` at time 1. `next` holds the hashes of
    /// `parents` in the order given. A clock already at `u64::MAX` fails with
    /// [`DagError::Clock`] before anything is written.
    pub async fn create_with_version<S>(
        store: &S,
        log_id: &LogId,
        clock: Option<&LamportClock>,
        payload: Value,
        parents: &[Arc<Entry>],
        version: u32,
    ) -> DagResult<Entry>
    where
        S: ObjectStore + ?Sized,
    {
        let clock = match clock {
            Some(clock) => clock.tick()?,
            None => LamportClock::new(log_id.clone(), 1),
        };
        let next: Vec<ContentId> = parents.iter().map(|p| p.hash).collect();

        let record = EntryRecord {
            id: log_id,
            payload: &payload,
            next: &next,
            clock: &clock,
            version,
        };
        let bytes =
            serde_json::to_vec(&record).map_err(|e| DagError::Serialization(e.to_string()))?;
        let hash = store.put(Bytes::from(bytes)).await?;

        debug!(
            hash = %hash.short_hex(),
            log = %log_id,
            time = clock.time,
            parents = next.len(),
            "created entry"
        );

        Ok(Entry {
            hash,
            id: log_id.clone(),
            payload,
            next,
            clock,
            version,
        })
    }

    /// Read and decode the entry stored under `hash`.
    pub async fn fetch<S>(store: &S, hash: &ContentId) -> DagResult<Entry>
    where
        S: ObjectStore + ?Sized,
    {
        let bytes = store.get(hash).await?;
        Self::decode(*hash, &bytes)
    }

    /// The persisted record bytes of this entry.
    pub fn encode(&self) -> DagResult<Vec<u8>> {
        let record = EntryRecord {
            id: &self.id,
            payload: &self.payload,
            next: &self.next,
            clock: &self.clock,
            version: self.version,
        };
        serde_json::to_vec(&record).map_err(|e| DagError::Serialization(e.to_string()))
    }

    /// Decode a record read under `hash`.
    ///
    /// Anything that is not a complete record is rejected with
    /// [`DagError::InvalidEntry`]. That includes empty log or clock ids, which
    /// [`LogId`] refuses to decode.
    pub fn decode(hash: ContentId, bytes: &[u8]) -> DagResult<Entry> {
        let stored: StoredEntry =
            serde_json::from_slice(bytes).map_err(|e| DagError::InvalidEntry {
                hash,
                reason: e.to_string(),
            })?;

        Ok(Entry {
            hash,
            id: stored.id,
            payload: stored.payload,
            next: stored.next,
            clock: stored.clock,
            version: stored.version,
        })
    }

    /// Returns `true` if `parent` is an immediate causal predecessor of `child`.
    pub fn is_parent(child: &Entry, parent: &Entry) -> bool {
        child.next.contains(&parent.hash)
    }

    /// Ordering key among causally unrelated entries: time, then log id, then
    /// hash.
    pub fn sort_key(&self) -> (u64, &LogId, &ContentId) {
        (self.clock.time, &self.clock.id, &self.hash)
    }

    /// Compare two entries knowing only each other.
    ///
    /// A direct parent orders before its child. Otherwise entries order by
    /// [`sort_key`](Self::sort_key). This only sees one hop of ancestry, so
    /// it is not a substitute for [`EntrySet::sort`](crate::EntrySet::sort),
    /// which is the canonical order. The two agree whenever clock times grow
    /// along parent links, as they do for entries made by
    /// [`create`](Self::create).
    pub fn compare_adjacent(a: &Entry, b: &Entry) -> Ordering {
        if a.hash == b.hash {
            return Ordering::Equal;
        }
        if Self::is_parent(b, a) {
            return Ordering::Less;
        }
        if Self::is_parent(a, b) {
            return Ordering::Greater;
        }
        a.sort_key().cmp(&b.sort_key())
    }
}
