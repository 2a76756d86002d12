//! The log value and its pure operations.
//!
//! A [`Log`] is never mutated: `create`, `join` and the store-backed
//! operations in [`Replica`](crate::Replica) all return a new value and leave
//! their inputs valid and unchanged.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use mlog_dag::{Entry, EntrySet};
use mlog_types::{ContentId, LamportClock, LogId};

use crate::descriptor::LogDescriptor;
use crate::error::{LogError, LogResult};

/// Optional inputs to [`Log::create`].
#[derive(Clone, Debug, Default)]
pub struct LogOptions {
    /// Log id. Derived from the first head's clock when absent.
    pub id: Option<LogId>,
    /// Explicit head hashes. Hashes not in the (capped) entry set are ignored.
    pub heads: Option<Vec<ContentId>>,
    /// Log clock. Derived from the newest entry time when absent.
    pub clock: Option<LamportClock>,
    /// Keep only the last `size` entries.
    pub size: Option<usize>,
    /// Entries are already in canonical order.
    pub sorted: bool,
}

impl LogOptions {
    pub fn id(mut self, id: LogId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn heads(mut self, heads: Vec<ContentId>) -> Self {
        self.heads = Some(heads);
        self
    }

    pub fn clock(mut self, clock: LamportClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn size(mut self, size: Option<usize>) -> Self {
        self.size = size;
        self
    }

    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }
}

/// An append-only, multi-writer log.
#[derive(Clone, Debug)]
pub struct Log {
    id: LogId,
    clock: LamportClock,
    entries: EntrySet,
    heads: Vec<Arc<Entry>>,
}

impl Log {
    /// An empty log with a zero clock.
    ///
    /// Fails with [`LogError::InvalidArgument`] when `id` is empty.
    pub fn new(id: impl Into<String>) -> LogResult<Self> {
        Ok(Self::with_id(LogId::new(id)?))
    }

    /// An empty log with a zero clock for an already validated id.
    pub fn with_id(id: LogId) -> Self {
        Self {
            clock: LamportClock::zero(id.clone()),
            id,
            entries: EntrySet::new(),
            heads: Vec::new(),
        }
    }

    /// Build a log from entries.
    ///
    /// Entries are sorted unless `options.sorted`, then capped to the last
    /// `options.size`. Heads are the explicit ones that survived the cap, or
    /// the set's heads. Fails with [`LogError::InvalidArgument`] when no id is
    /// given and none can be derived because there are no entries.
    pub fn create(entries: EntrySet, options: LogOptions) -> LogResult<Log> {
        let entries = if options.sorted {
            entries
        } else {
            entries.sort()
        };
        let entries = entries.last(options.size);

        let mut heads: Vec<Arc<Entry>> = options
            .heads
            .unwrap_or_default()
            .iter()
            .filter_map(|h| entries.get(h).cloned())
            .collect();
        if heads.is_empty() {
            heads = entries.heads();
        }

        let id = match options.id {
            Some(id) => id,
            None => match (&options.clock, heads.first()) {
                (Some(clock), _) => clock.id.clone(),
                (None, Some(head)) => head.clock.id.clone(),
                (None, None) => {
                    return Err(LogError::InvalidArgument(
                        "a log id is required for an empty log".into(),
                    ))
                }
            },
        };

        let clock = options.clock.unwrap_or_else(|| {
            let time = entries.iter().map(|e| e.clock.time).max().unwrap_or(0);
            LamportClock::new(id.clone(), time)
        });

        Ok(Log {
            id,
            clock,
            entries,
            heads,
        })
    }

    /// The log after adding `entry`, which must be the child of all current
    /// heads. It becomes the only head and its clock the log clock.
    pub(crate) fn with_appended(&self, entry: Entry) -> Log {
        let entry = Arc::new(entry);
        Log {
            id: self.id.clone(),
            clock: entry.clock.clone(),
            entries: self.entries.append(entry.clone()),
            heads: vec![entry],
        }
    }

    /// Conflict-free merge of two logs.
    ///
    /// The result holds the union of both entry sets in canonical order,
    /// capped at `size`. Its id is `id` or else the greater of the two ids,
    /// and its clock is at the later of the two times. Commutative,
    /// associative and idempotent on the resulting entry sequence.
    pub fn join(a: &Log, b: &Log, size: Option<usize>, id: Option<LogId>) -> LogResult<Log> {
        let id = id.unwrap_or_else(|| a.id.clone().max(b.id.clone()));
        let entries = a.entries.merge(&b.entries);
        let clock = LamportClock::new(id.clone(), a.clock.time).merge(&b.clock);

        debug!(
            log = %id,
            left = a.len(),
            right = b.len(),
            joined = entries.len(),
            "joined logs"
        );

        Log::create(
            entries,
            LogOptions::default()
                .id(id)
                .clock(clock)
                .size(size)
                .sorted(true),
        )
    }

    /// Left fold of [`join`](Self::join) over `logs`.
    pub fn join_all(logs: &[Log], size: Option<usize>) -> LogResult<Log> {
        let (first, rest) = logs.split_first().ok_or(LogError::LogRequired)?;
        rest.iter()
            .try_fold(first.clone(), |acc, log| Log::join(&acc, log, size, None))
    }

    pub fn id(&self) -> &LogId {
        &self.id
    }

    pub fn clock(&self) -> &LamportClock {
        &self.clock
    }

    pub fn entries(&self) -> &EntrySet {
        &self.entries
    }

    pub fn heads(&self) -> &[Arc<Entry>] {
        &self.heads
    }

    /// Entries in canonical order.
    pub fn values(&self) -> &[Arc<Entry>] {
        self.entries.values()
    }

    /// Payloads in canonical order.
    pub fn payloads(&self) -> Vec<&Value> {
        self.entries.iter().map(|e| &e.payload).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, hash: &ContentId) -> Option<&Arc<Entry>> {
        self.entries.get(hash)
    }

    pub fn has(&self, hash: &ContentId) -> bool {
        self.entries.contains(hash)
    }

    /// Entries whose parents are not all held locally.
    pub fn tails(&self) -> Vec<Arc<Entry>> {
        self.entries.tails()
    }

    /// Parent hashes referenced but not held locally.
    pub fn tail_hashes(&self) -> Vec<ContentId> {
        self.entries.tail_hashes()
    }

    pub fn to_descriptor(&self) -> LogDescriptor {
        LogDescriptor {
            id: self.id.clone(),
            heads: self.heads.iter().map(|e| e.hash).collect(),
        }
    }

    /// JSON bytes of the `{id, heads}` descriptor.
    pub fn to_bytes(&self) -> LogResult<Vec<u8>> {
        self.to_descriptor().to_bytes()
    }
}

impl PartialEq for Log {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.clock == other.clock
            && self.entries == other.entries
            && self.heads.len() == other.heads.len()
            && self
                .heads
                .iter()
                .zip(other.heads.iter())
                .all(|(a, b)| a.hash == b.hash)
    }
}

impl Eq for Log {}

/// Renders the log newest first, indenting each entry by its chain of
/// descendants.
///
/// ```text
/// three
/// └─two
///   └─one
/// ```
impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.entries.values();

        // parent -> its first child in canonical order
        let mut first_child: HashMap<ContentId, ContentId> = HashMap::new();
        for entry in values {
            for parent in &entry.next {
                first_child.entry(*parent).or_insert(entry.hash);
            }
        }

        // Children sort after their parents, so walking newest first always
        // finds a child's chain length already recorded.
        let mut chain_len: HashMap<ContentId, usize> = HashMap::with_capacity(values.len());
        for (i, entry) in values.iter().rev().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let descendants = first_child
                .get(&entry.hash)
                .map_or(0, |child| chain_len.get(child).map_or(1, |n| n + 1));
            chain_len.insert(entry.hash, descendants);
            if descendants > 1 {
                write!(f, "{}", "  ".repeat(descendants - 1))?;
            }
            if descendants > 0 {
                write!(f, "└─")?;
            }
            match &entry.payload {
                Value::String(s) => write!(f, "{s}")?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlog_dag::ENTRY_VERSION;
    use serde_json::json;

    fn entry(label: &str, writer: &str, time: u64, next: &[&Arc<Entry>]) -> Arc<Entry> {
        Arc::new(Entry {
            hash: ContentId::from_bytes(label.as_bytes()),
            id: log_id(writer),
            payload: json!(label),
            next: next.iter().map(|e| e.hash).collect(),
            clock: LamportClock::new(log_id(writer), time),
            version: ENTRY_VERSION,
        })
    }

    fn log_id(s: &str) -> LogId {
        LogId::new(s).unwrap()
    }

    fn strings(log: &Log) -> Vec<&str> {
        log.payloads().into_iter().filter_map(Value::as_str).collect()
    }

    #[test]
    fn new_log_is_empty_with_zero_clock() {
        let log = Log::new("A").unwrap();
        assert!(log.is_empty());
        assert!(log.heads().is_empty());
        assert_eq!(log.clock(), &LamportClock::zero(log_id("A")));
        assert_eq!(log.to_string(), "");
        assert_eq!(Log::with_id(log_id("A")), log);
    }

    #[test]
    fn new_log_rejects_empty_id() {
        let err = Log::new("").unwrap_err();
        assert!(matches!(err, LogError::InvalidArgument(_)));
        assert!(matches!(Log::new(String::new()), Err(LogError::InvalidArgument(_))));
    }

    #[test]
    fn create_derives_id_heads_and_clock() {
        let one = entry("one", "A", 1, &[]);
        let two = entry("two", "A", 2, &[&one]);
        let log = Log::create(
            EntrySet::from_entries(vec![two.clone(), one]),
            LogOptions::default(),
        )
        .unwrap();

        assert_eq!(strings(&log), vec!["one", "two"]);
        assert_eq!(log.id().as_str(), "A");
        assert_eq!(log.clock(), &LamportClock::new(log_id("A"), 2));
        assert_eq!(log.heads().len(), 1);
        assert_eq!(log.heads()[0].hash, two.hash);
    }

    #[test]
    fn create_without_id_or_entries_fails() {
        let err = Log::create(EntrySet::new(), LogOptions::default()).unwrap_err();
        assert!(matches!(err, LogError::InvalidArgument(_)));

        let log = Log::create(EntrySet::new(), LogOptions::default().id(log_id("X"))).unwrap();
        assert!(log.is_empty());
        assert_eq!(log.clock().time, 0);
    }

    #[test]
    fn create_caps_to_the_newest_entries() {
        let one = entry("one", "A", 1, &[]);
        let two = entry("two", "A", 2, &[&one]);
        let three = entry("three", "A", 3, &[&two]);
        let log = Log::create(
            EntrySet::from_entries(vec![one.clone(), two, three]),
            LogOptions::default().size(Some(2)).heads(vec![one.hash]),
        )
        .unwrap();

        assert_eq!(strings(&log), vec!["two", "three"]);
        // The explicit head was evicted by the cap, so heads are recomputed.
        assert_eq!(log.heads().len(), 1);
        assert_eq!(log.heads()[0].payload, json!("three"));
        assert_eq!(log.tail_hashes(), vec![one.hash]);
    }

    #[test]
    fn join_orders_concurrent_entries_by_id() {
        let a = Log::create(
            EntrySet::from_entries(vec![entry("A", "A", 1, &[])]),
            LogOptions::default(),
        )
        .unwrap();
        let b = Log::create(
            EntrySet::from_entries(vec![entry("B", "B", 1, &[])]),
            LogOptions::default(),
        )
        .unwrap();

        let ab = Log::join(&a, &b, None, None).unwrap();
        assert_eq!(strings(&ab), vec!["A", "B"]);
        assert_eq!(ab.id().as_str(), "B");
        assert_eq!(ab.heads().len(), 2);
        assert_eq!(Log::join(&b, &a, None, None).unwrap(), ab);

        let named = Log::join(&a, &b, None, Some(log_id("Q"))).unwrap();
        assert_eq!(named.id().as_str(), "Q");
        assert_eq!(named.clock(), &LamportClock::new(log_id("Q"), 1));
    }

    #[test]
    fn join_clock_takes_the_later_time() {
        let a1 = entry("a1", "A", 1, &[]);
        let a2 = entry("a2", "A", 2, &[&a1]);
        let a3 = entry("a3", "A", 3, &[&a2]);
        let b1 = entry("b1", "B", 1, &[]);
        let a = Log::create(EntrySet::from_entries(vec![a1, a2, a3]), LogOptions::default()).unwrap();
        let b = Log::create(EntrySet::from_entries(vec![b1]), LogOptions::default()).unwrap();

        for joined in [
            Log::join(&a, &b, None, None).unwrap(),
            Log::join(&b, &a, None, None).unwrap(),
        ] {
            assert_eq!(joined.clock(), &LamportClock::new(log_id("B"), 3));
        }
    }

    #[test]
    fn join_respects_size() {
        let a1 = entry("a1", "A", 1, &[]);
        let a2 = entry("a2", "A", 2, &[&a1]);
        let b1 = entry("b1", "B", 1, &[]);
        let a = Log::create(EntrySet::from_entries(vec![a1, a2]), LogOptions::default()).unwrap();
        let b = Log::create(EntrySet::from_entries(vec![b1]), LogOptions::default()).unwrap();

        let joined = Log::join(&a, &b, Some(2), None).unwrap();
        assert_eq!(strings(&joined), vec!["b1", "a2"]);
    }

    #[test]
    fn join_all_requires_a_log() {
        assert!(matches!(Log::join_all(&[], None), Err(LogError::LogRequired)));

        let a = Log::create(
            EntrySet::from_entries(vec![entry("x", "A", 1, &[])]),
            LogOptions::default(),
        )
        .unwrap();
        assert_eq!(Log::join_all(std::slice::from_ref(&a), None).unwrap(), a);
    }

    #[test]
    fn display_renders_a_tree() {
        let one = entry("one", "A", 1, &[]);
        let two = entry("two", "A", 2, &[&one]);
        let three = entry("three", "A", 3, &[&two]);
        let log = Log::create(
            EntrySet::from_entries(vec![one, two, three]),
            LogOptions::default(),
        )
        .unwrap();
        assert_eq!(log.to_string(), "three\n└─two\n  └─one");
    }

    #[test]
    fn display_indents_by_first_child_chain() {
        let a1 = entry("a1", "A", 1, &[]);
        let b1 = entry("b1", "B", 1, &[]);
        let m = entry("m", "C", 2, &[&a1, &b1]);
        let c = entry("c", "C", 3, &[&m]);
        let log = Log::create(
            EntrySet::from_entries(vec![c, m, b1, a1]),
            LogOptions::default(),
        )
        .unwrap();

        assert_eq!(log.to_string(), "c\n└─m\n  └─b1\n  └─a1");
        // Indentation matches the descendant chain of each entry.
        let values = log.values();
        let depths: Vec<usize> = values
            .iter()
            .rev()
            .map(|e| EntrySet::find_children(values, e).len())
            .collect();
        assert_eq!(depths, vec![0, 1, 2, 2]);
    }

    #[test]
    fn descriptor_names_id_and_heads() {
        let one = entry("one", "A", 1, &[]);
        let log = Log::create(
            EntrySet::from_entries(vec![one.clone()]),
            LogOptions::default(),
        )
        .unwrap();
        let descriptor = log.to_descriptor();
        assert_eq!(descriptor.id.as_str(), "A");
        assert_eq!(descriptor.heads, vec![one.hash]);
        assert_eq!(
            LogDescriptor::from_bytes(&log.to_bytes().unwrap()).unwrap(),
            descriptor
        );
    }
}
