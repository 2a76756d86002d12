//! Breadth-first, timeout-guarded loading of entries from an object store.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use mlog_dag::Entry;
use mlog_store::ObjectStore;
use mlog_types::ContentId;

use crate::config::LoaderConfig;

/// Callback invoked for every entry read from the store: the hash it was
/// read under, the decoded entry, and its distance from the starting hash.
pub type ProgressFn = Arc<dyn Fn(&ContentId, &Entry, usize) + Send + Sync>;

/// Per-call traversal options.
#[derive(Clone, Default)]
pub struct FetchOptions {
    /// Stop after this many entries have been collected. `None` is unbounded.
    pub limit: Option<usize>,
    /// Entries the caller already holds. They are never read from the store
    /// and never returned, but their parents are still traversed.
    pub exclude: Vec<Arc<Entry>>,
    /// Progress callback.
    pub on_progress: Option<ProgressFn>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn exclude(mut self, entries: impl IntoIterator<Item = Arc<Entry>>) -> Self {
        self.exclude.extend(entries);
        self
    }

    pub fn on_progress(mut self, f: ProgressFn) -> Self {
        self.on_progress = Some(f);
        self
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("limit", &self.limit)
            .field("exclude", &self.exclude.len())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Breadth-first loader of entry graphs.
///
/// Traversal errors are never fatal: an object that is missing, undecodable
/// or slower than [`LoaderConfig::fetch_timeout`] is logged and its branch is
/// skipped, so the caller always gets whatever part of the graph was
/// reachable.
#[derive(Clone, Debug, Default)]
pub struct LogLoader {
    config: LoaderConfig,
}

impl LogLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Walk `next` references breadth-first from `start`.
    ///
    /// Returns the fetched entries in discovery order (not canonical order).
    /// Each hash is visited at most once per call.
    pub async fn fetch_all<S>(
        &self,
        store: &S,
        start: &[ContentId],
        options: &FetchOptions,
    ) -> Vec<Arc<Entry>>
    where
        S: ObjectStore + ?Sized,
    {
        let timeout = self.config.fetch_timeout();
        let limit_reached = |n: usize| options.limit.is_some_and(|limit| n >= limit);

        let mut cache: HashMap<ContentId, Arc<Entry>> = options
            .exclude
            .iter()
            .map(|e| (e.hash, e.clone()))
            .collect();
        let mut visited: HashSet<ContentId> = HashSet::new();
        let mut queue: VecDeque<(ContentId, usize)> = start.iter().map(|h| (*h, 0)).collect();
        let mut result: Vec<Arc<Entry>> = Vec::new();

        while let Some((hash, depth)) = queue.pop_front() {
            if limit_reached(result.len()) {
                break;
            }
            if !visited.insert(hash) {
                continue;
            }

            if let Some(known) = cache.get(&hash) {
                queue.extend(known.next.iter().map(|h| (*h, depth + 1)));
                continue;
            }

            match tokio::time::timeout(timeout, Entry::fetch(store, &hash)).await {
                Ok(Ok(entry)) => {
                    if let Some(on_progress) = &options.on_progress {
                        on_progress(&hash, &entry, depth);
                    }
                    queue.extend(entry.next.iter().map(|h| (*h, depth + 1)));
                    let entry = Arc::new(entry);
                    cache.insert(hash, entry.clone());
                    result.push(entry);
                    debug!(hash = %hash.short_hex(), depth, "fetched entry");
                }
                Ok(Err(e)) => {
                    warn!(hash = %hash.short_hex(), error = %e, "skipping unreadable entry");
                }
                Err(_) => {
                    warn!(
                        hash = %hash.short_hex(),
                        timeout_ms = self.config.fetch_timeout_ms,
                        "entry fetch timed out, skipping branch"
                    );
                }
            }
        }

        debug!(start = start.len(), fetched = result.len(), "traversal finished");
        result
    }

    /// Run [`fetch_all`](Self::fetch_all) once per chain of starting hashes,
    /// with at most `concurrency` traversals in flight, and concatenate the
    /// results in chain order.
    ///
    /// `concurrency` falls back to [`LoaderConfig::concurrency`] and then to
    /// the number of chains. The limit in `options` applies to each chain.
    /// Duplicates across chains are possible; callers merge the result into an
    /// `EntrySet`, which collapses them.
    pub async fn fetch_parallel<S>(
        &self,
        store: &S,
        chains: &[Vec<ContentId>],
        options: &FetchOptions,
        concurrency: Option<usize>,
    ) -> Vec<Arc<Entry>>
    where
        S: ObjectStore + ?Sized,
    {
        let concurrency = concurrency
            .or(self.config.concurrency)
            .unwrap_or(chains.len())
            .max(1);

        let fetched: Vec<Vec<Arc<Entry>>> = stream::iter(chains.iter())
            .map(|start| self.fetch_all(store, start, options))
            .buffered(concurrency)
            .collect()
            .await;

        fetched.into_iter().flatten().collect()
    }

    /// [`fetch_parallel`](Self::fetch_parallel) with one chain per hash.
    pub async fn fetch_each<S>(
        &self,
        store: &S,
        hashes: &[ContentId],
        options: &FetchOptions,
    ) -> Vec<Arc<Entry>>
    where
        S: ObjectStore + ?Sized,
    {
        let chains: Vec<Vec<ContentId>> = hashes.iter().map(|h| vec![*h]).collect();
        self.fetch_parallel(store, &chains, options, None).await
    }
}
