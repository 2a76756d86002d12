//! Grow-only sets of entries and their canonical order.
//!
//! [`EntrySet`] is an immutable, ordered materialization of a set of
//! [`Entry`] values keyed by hash. Every operation returns a new set. The
//! ordered vector is paired with a `ContentId -> position` index so lookups
//! by hash do not scan.
//!
//! # Canonical order
//!
//! [`EntrySet::sort`] is a topological linearization of the `next` relation
//! restricted to the set: an entry is emitted only after every parent that is
//! present in the set. Among the entries that are ready at each step, the one
//! with the smallest [`Entry::sort_key`] (clock time, then log id, then hash)
//! goes first. The result depends only on the set's contents, never on the
//! input order, which is what lets independent replicas agree.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use mlog_types::{ContentId, LogId};

use crate::entry::Entry;

/// An immutable ordered set of entries, unique by hash.
#[derive(Clone, Debug, Default)]
pub struct EntrySet {
    values: Vec<Arc<Entry>>,
    index: HashMap<ContentId, usize>,
}

impl EntrySet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from entries in the given order.
    ///
    /// Later duplicates (by hash) are dropped. The input is not sorted.
    pub fn from_entries(entries: impl IntoIterator<Item = Arc<Entry>>) -> Self {
        let mut set = Self::new();
        for entry in entries {
            set.push(entry);
        }
        set
    }

    fn push(&mut self, entry: Arc<Entry>) {
        if self.index.contains_key(&entry.hash) {
            return;
        }
        self.index.insert(entry.hash, self.values.len());
        self.values.push(entry);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the set holds no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in their current order.
    pub fn values(&self) -> &[Arc<Entry>] {
        &self.values
    }

    /// Iterate over the entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Entry>> {
        self.values.iter()
    }

    /// Entry hashes in order.
    pub fn keys(&self) -> Vec<ContentId> {
        self.values.iter().map(|e| e.hash).collect()
    }

    /// Look up an entry by hash.
    pub fn get(&self, hash: &ContentId) -> Option<&Arc<Entry>> {
        self.index.get(hash).map(|&i| &self.values[i])
    }

    /// Returns `true` if an entry with this hash is in the set.
    pub fn contains(&self, hash: &ContentId) -> bool {
        self.index.contains_key(hash)
    }

    /// Returns `true` if `entry` is in the set.
    pub fn has(&self, entry: &Entry) -> bool {
        self.contains(&entry.hash)
    }

    /// The set with `entry` added at the end (unchanged if already present).
    pub fn append(&self, entry: Arc<Entry>) -> Self {
        let mut set = self.clone();
        set.push(entry);
        set
    }

    /// The canonical linearization of this set.
    pub fn sort(&self) -> Self {
        Self::from_entries(Self::linearize(&self.values))
    }

    /// The last `n` entries, or all entries for `None`.
    pub fn last(&self, n: Option<usize>) -> Self {
        match n {
            None => self.clone(),
            Some(n) => {
                let start = self.values.len().saturating_sub(n);
                self.slice(start, None)
            }
        }
    }

    /// Entries in positions `start..end` (clamped), `end = None` meaning the end.
    pub fn slice(&self, start: usize, end: Option<usize>) -> Self {
        let len = self.values.len();
        let end = end.unwrap_or(len).min(len);
        let start = start.min(end);
        Self::from_entries(self.values[start..end].iter().cloned())
    }

    /// Union of both sets in canonical order.
    ///
    /// Commutative, associative and idempotent on the resulting sequence.
    pub fn merge(&self, other: &EntrySet) -> Self {
        Self::from_entries(self.values.iter().chain(other.values.iter()).cloned()).sort()
    }

    /// Entries of `other` that are not in this set, in `other`'s order.
    pub fn difference(&self, other: &EntrySet) -> Self {
        Self::from_entries(other.values.iter().filter(|e| !self.has(e)).cloned())
    }

    /// Entries of `other` that are also in this set, in `other`'s order.
    pub fn intersection(&self, other: &EntrySet) -> Self {
        Self::from_entries(other.values.iter().filter(|e| self.has(e)).cloned())
    }

    /// Replace the first `with.len()` entries by `with`, keeping the rest.
    ///
    /// Used to pin anchor entries that a size cap would otherwise evict.
    pub fn replace_in_front(&self, with: &EntrySet) -> Self {
        let keep_from = with.len().min(self.values.len());
        Self::from_entries(
            with.values
                .iter()
                .chain(self.values[keep_from..].iter())
                .cloned(),
        )
    }

    /// Heads of this set. See [`find_heads`](Self::find_heads).
    pub fn heads(&self) -> Vec<Arc<Entry>> {
        Self::find_heads(&self.values)
    }

    /// Tails of this set. See [`find_tails`](Self::find_tails).
    pub fn tails(&self) -> Vec<Arc<Entry>> {
        Self::find_tails(&self.values)
    }

    /// Missing parent hashes. See [`find_tail_hashes`](Self::find_tail_hashes).
    pub fn tail_hashes(&self) -> Vec<ContentId> {
        Self::find_tail_hashes(&self.values)
    }

    /// Entries not referenced by any other entry's `next`.
    ///
    /// Ordered by the log id that wrote them, then by hash.
    pub fn find_heads(entries: &[Arc<Entry>]) -> Vec<Arc<Entry>> {
        let referenced: HashSet<&ContentId> = entries.iter().flat_map(|e| e.next.iter()).collect();

        let mut heads: Vec<Arc<Entry>> = Vec::new();
        let mut seen = HashSet::new();
        for entry in entries {
            if !referenced.contains(&entry.hash) && seen.insert(entry.hash) {
                heads.push(entry.clone());
            }
        }
        heads.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.hash.cmp(&b.hash)));
        heads
    }

    /// Entries on the boundary of partial knowledge.
    ///
    /// An entry is a tail when one of its parents is absent from `entries` or
    /// when it has no parents at all. The result is in canonical order.
    pub fn find_tails(entries: &[Arc<Entry>]) -> Vec<Arc<Entry>> {
        let present: HashSet<ContentId> = entries.iter().map(|e| e.hash).collect();

        // missing parent hash -> entries referencing it
        let mut reverse_index: HashMap<ContentId, Vec<Arc<Entry>>> = HashMap::new();
        let mut roots = Vec::new();
        for entry in entries {
            if entry.next.is_empty() {
                roots.push(entry.clone());
            }
            for hash in entry.next.iter().filter(|h| !present.contains(h)) {
                reverse_index.entry(*hash).or_default().push(entry.clone());
            }
        }

        let tails = EntrySet::from_entries(reverse_index.into_values().flatten().chain(roots));
        tails.sort().values
    }

    /// Hashes referenced by entries in `entries` but absent from it.
    ///
    /// Each entry's parents are visited in reverse and every missing hash is
    /// pushed to the front, so the result approximates oldest-first. Each hash
    /// appears once.
    pub fn find_tail_hashes(entries: &[Arc<Entry>]) -> Vec<ContentId> {
        let present: HashSet<ContentId> = entries.iter().map(|e| e.hash).collect();

        let mut found: VecDeque<ContentId> = VecDeque::new();
        for entry in entries {
            for hash in entry.next.iter().rev() {
                if !present.contains(hash) {
                    found.push_front(*hash);
                }
            }
        }

        let mut seen = HashSet::new();
        found.into_iter().filter(|h| seen.insert(*h)).collect()
    }

    /// The chain of descendants of `entry` within `entries`.
    ///
    /// Starting at `entry`, repeatedly step to the first entry that lists the
    /// current one as a parent. The walk visits each entry at most once.
    pub fn find_children(entries: &[Arc<Entry>], entry: &Entry) -> Vec<Arc<Entry>> {
        let mut chain: Vec<Arc<Entry>> = Vec::new();
        let mut visited: HashSet<ContentId> = HashSet::new();
        visited.insert(entry.hash);

        let mut current = entry.hash;
        while chain.len() < entries.len() {
            let Some(child) = entries
                .iter()
                .find(|e| e.next.contains(&current) && !visited.contains(&e.hash))
            else {
                break;
            };
            visited.insert(child.hash);
            current = child.hash;
            chain.push(child.clone());
        }

        chain.sort_by_key(|e| e.clock.time);
        chain
    }

    /// Topological order with `(time, id, hash)` priority among ready entries.
    fn linearize(entries: &[Arc<Entry>]) -> Vec<Arc<Entry>> {
        let position: HashMap<ContentId, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.hash, i))
            .collect();

        // in_degree[i] = number of distinct parents of entry i present here.
        let mut in_degree = vec![0usize; entries.len()];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
        for (i, entry) in entries.iter().enumerate() {
            let parents: HashSet<usize> = entry
                .next
                .iter()
                .filter_map(|h| position.get(h).copied())
                .filter(|&p| p != i)
                .collect();
            in_degree[i] = parents.len();
            for p in parents {
                children[p].push(i);
            }
        }

        type ReadyKey = Reverse<(u64, LogId, ContentId, usize)>;
        let key = |i: usize| -> ReadyKey {
            let e = &entries[i];
            Reverse((e.clock.time, e.clock.id.clone(), e.hash, i))
        };

        let mut ready: BinaryHeap<ReadyKey> = (0..entries.len())
            .filter(|&i| in_degree[i] == 0)
            .map(key)
            .collect();

        let mut emitted = vec![false; entries.len()];
        let mut result = Vec::with_capacity(entries.len());
        while let Some(Reverse((_, _, _, i))) = ready.pop() {
            emitted[i] = true;
            result.push(entries[i].clone());
            for &c in &children[i] {
                in_degree[c] -= 1;
                if in_degree[c] == 0 {
                    ready.push(key(c));
                }
            }
        }

        // Only reachable with a reference cycle, which content addressing rules out.
        if result.len() < entries.len() {
            let mut rest: Vec<Arc<Entry>> = entries
                .iter()
                .enumerate()
                .filter(|(i, _)| !emitted[*i])
                .map(|(_, e)| e.clone())
                .collect();
            rest.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
            result.extend(rest);
        }

        result
    }
}

impl PartialEq for EntrySet {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| a.hash == b.hash)
    }
}

impl Eq for EntrySet {}

impl FromIterator<Arc<Entry>> for EntrySet {
    fn from_iter<T: IntoIterator<Item = Arc<Entry>>>(iter: T) -> Self {
        Self::from_entries(iter)
    }
}

impl From<Vec<Arc<Entry>>> for EntrySet {
    fn from(entries: Vec<Arc<Entry>>) -> Self {
        Self::from_entries(entries)
    }
}

impl<'a> IntoIterator for &'a EntrySet {
    type Item = &'a Arc<Entry>;
    type IntoIter = std::slice::Iter<'a, Arc<Entry>>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
