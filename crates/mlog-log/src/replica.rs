//! Store-backed operations on logs: append, expand, and reconstruction from
//! hashes.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, info};

use mlog_dag::{Entry, EntrySet};
use mlog_store::{ObjectStore, StoreError};
use mlog_sync::{FetchOptions, LogLoader};
use mlog_types::{ContentId, IdGenerator, UuidIds};

use crate::config::ReplicaConfig;
use crate::descriptor::LogDescriptor;
use crate::error::{LogError, LogResult};
use crate::log::{Log, LogOptions};

/// Store-backed log operations.
///
/// A replica owns nothing but its collaborators: the object store, the loader
/// that walks it, and the generator that names new logs. Every operation takes
/// a [`Log`] by reference and returns a new one.
pub struct Replica<S: ObjectStore + ?Sized> {
    store: Arc<S>,
    loader: LogLoader,
    ids: Arc<dyn IdGenerator>,
    config: ReplicaConfig,
}

impl<S: ObjectStore + ?Sized> Replica<S> {
    /// A replica with default configuration and UUID v7 log ids.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, ReplicaConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: ReplicaConfig) -> Self {
        Self {
            store,
            loader: LogLoader::new(config.loader.clone()),
            ids: Arc::new(UuidIds),
            config,
        }
    }

    /// Replace the generator used by [`create_log`](Self::create_log).
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    /// An empty log with a freshly generated id.
    pub fn create_log(&self) -> Log {
        Log::with_id(self.ids.next_id())
    }

    /// Append `payload` to `log`.
    ///
    /// The new entry's parents are the log's heads and its clock is the log
    /// clock ticked once. Fails with [`LogError::StoreUnavailable`] if the
    /// entry cannot be written, and with [`LogError::InvalidArgument`] if the
    /// log clock is already at `u64::MAX`.
    pub async fn append(&self, log: &Log, payload: Value) -> LogResult<Log> {
        let entry = Entry::create_with_version(
            self.store.as_ref(),
            log.id(),
            Some(log.clock()),
            payload,
            log.heads(),
            self.config.entry_version,
        )
        .await?;

        debug!(
            log = %log.id(),
            hash = %entry.hash.short_hex(),
            time = entry.clock.time,
            entries = log.len() + 1,
            "appended entry"
        );
        Ok(log.with_appended(entry))
    }

    /// Pull up to `amount` older entries behind the log's tails.
    ///
    /// Entries the log already holds are never evicted to make room: the
    /// result holds every current entry plus the newest `amount` of the
    /// fetched ones. A log without tail hashes is returned unchanged.
    pub async fn expand(&self, log: &Log, amount: Option<usize>) -> LogResult<Log> {
        let tail_hashes = log.tail_hashes();
        if tail_hashes.is_empty() {
            return Ok(log.clone());
        }

        let options = FetchOptions::new()
            .limit(amount)
            .exclude(log.values().iter().cloned());
        let fetched = EntrySet::from_entries(
            self.loader
                .fetch_each(self.store.as_ref(), &tail_hashes, &options)
                .await,
        );

        let size = amount.map(|a| log.len() + a);
        let current = log.entries();
        let sliced = current.merge(&fetched).last(size);

        let missing_old = sliced.difference(current);
        let new_only = current.difference(&sliced);
        let kept_old = current.intersection(&sliced);

        let room = size.map(|s| s.saturating_sub(kept_old.len() + missing_old.len()));
        let remaining_new = new_only.last(room);

        let merged = kept_old.merge(&remaining_new).merge(&missing_old);
        debug!(
            log = %log.id(),
            fetched = fetched.len(),
            before = log.len(),
            after = merged.len(),
            "expanded log"
        );

        Log::create(
            merged,
            LogOptions::default()
                .id(log.id().clone())
                .clock(log.clock().clone())
                .size(size),
        )
    }

    /// Pull up to `amount` entries behind the parents of `from`.
    ///
    /// Each entry's parent list is fetched as one chain, all chains at once.
    /// Returns the log unchanged when none of `from` has parents.
    pub async fn expand_from(
        &self,
        log: &Log,
        from: &[Arc<Entry>],
        amount: Option<usize>,
    ) -> LogResult<Log> {
        let chains: Vec<Vec<ContentId>> = from
            .iter()
            .filter(|e| !e.next.is_empty())
            .map(|e| e.next.clone())
            .collect();
        if chains.is_empty() {
            return Ok(log.clone());
        }

        let options = FetchOptions::new()
            .limit(amount)
            .exclude(log.values().iter().cloned());
        let fetched = EntrySet::from_entries(
            self.loader
                .fetch_parallel(self.store.as_ref(), &chains, &options, Some(chains.len()))
                .await,
        );

        let size = amount.map(|a| log.len() + a);
        let entries = log.entries().merge(&fetched.slice(0, amount));

        Log::create(
            entries,
            LogOptions::default()
                .id(log.id().clone())
                .clock(log.clock().clone())
                .size(size)
                .sorted(true),
        )
    }

    /// Rebuild a log by walking back from `sources`.
    ///
    /// `options.limit` caps the result but never below the number of
    /// sources, which are always retained. Sources and `options.exclude` are
    /// not read from the store.
    pub async fn from_entry(&self, sources: &[Arc<Entry>], options: FetchOptions) -> LogResult<Log> {
        if sources.is_empty() {
            return Err(LogError::InvalidArgument(
                "at least one source entry is required".into(),
            ));
        }

        let sources = EntrySet::from_entries(sources.iter().cloned());
        let length = options.limit.map(|l| l.max(sources.len()));
        let options = FetchOptions {
            limit: length,
            ..options
        }
        .exclude(sources.iter().cloned());

        let fetched = EntrySet::from_entries(
            self.loader
                .fetch_each(self.store.as_ref(), &sources.keys(), &options)
                .await,
        );

        let sliced = sources.merge(&fetched).last(length);
        let missing_sources = sliced.difference(&sources);
        let result = sliced.replace_in_front(&missing_sources);

        Log::create(result, LogOptions::default())
    }

    /// Load a log from the descriptor stored under `hash`.
    ///
    /// The descriptor read itself is not skippable: a missing or timed-out
    /// root is [`LogError::NotFound`]. Entries behind the heads are loaded
    /// with the usual skip-on-failure traversal, bounded by `options.limit`.
    pub async fn from_multihash(&self, hash: &ContentId, options: FetchOptions) -> LogResult<Log> {
        let timeout = self.loader.config().fetch_timeout();
        let bytes = match tokio::time::timeout(timeout, self.store.get(hash)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(StoreError::NotFound(_))) | Err(_) => return Err(LogError::NotFound(*hash)),
            Ok(Err(e)) => return Err(LogError::StoreUnavailable(e)),
        };

        let descriptor = LogDescriptor::from_bytes(&bytes)?;
        let entries = self
            .loader
            .fetch_all(self.store.as_ref(), &descriptor.heads, &options)
            .await;

        info!(
            log = %descriptor.id,
            hash = %hash.short_hex(),
            entries = entries.len(),
            "loaded log"
        );

        Log::create(
            EntrySet::from_entries(entries),
            LogOptions::default()
                .id(descriptor.id)
                .heads(descriptor.heads),
        )
    }

    /// Persist the `{id, heads}` descriptor of `log` and return its hash.
    pub async fn to_multihash(&self, log: &Log) -> LogResult<ContentId> {
        if log.is_empty() {
            return Err(LogError::EmptyLog);
        }
        if log.heads().is_empty() {
            return Err(LogError::NoHeads);
        }

        let hash = self.store.put(Bytes::from(log.to_bytes()?)).await?;
        debug!(log = %log.id(), hash = %hash.short_hex(), "stored log descriptor");
        Ok(hash)
    }
}

impl<S: ObjectStore + ?Sized> fmt::Debug for Replica<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replica")
            .field("loader", &self.loader)
            .field("config", &self.config)
            .finish()
    }
}
