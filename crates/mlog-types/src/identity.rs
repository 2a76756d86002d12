//! Log identifiers and the generators that mint them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of a log.
///
/// The id doubles as the replica identity inside a [`LamportClock`]: entries
/// record the id of the log that created them, and concurrent entries with
/// equal clock times are ordered by this id. Ordering is plain lexicographic
/// string ordering. The empty string is never a valid id, including when
/// decoding.
///
/// [`LamportClock`]: crate::LamportClock
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogId(String);

impl LogId {
    /// Create a log id, rejecting the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::EmptyLogId);
        }
        Ok(Self(id))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogId({})", self.0)
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LogId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for LogId {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LogId> for String {
    fn from(id: LogId) -> Self {
        id.0
    }
}

impl AsRef<str> for LogId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of fresh identifiers for anonymous logs.
///
/// Injected into whatever constructs logs so construction stays
/// deterministic under test.
pub trait IdGenerator: Send + Sync {
    /// Produce the next identifier. Must never return the same id twice.
    fn next_id(&self) -> LogId;
}

/// Generates time-ordered UUID v7 identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> LogId {
        LogId(uuid::Uuid::now_v7().to_string())
    }
}

/// Generates `prefix-0`, `prefix-1`, ... in order.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> LogId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        LogId(format!("{}-{n}", self.prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_is_rejected() {
        assert_eq!(LogId::new(""), Err(TypeError::EmptyLogId));
        assert_eq!(LogId::new("A").unwrap().as_str(), "A");
    }

    #[test]
    fn conversions_validate() {
        assert_eq!(LogId::try_from(""), Err(TypeError::EmptyLogId));
        assert_eq!(LogId::try_from(String::new()), Err(TypeError::EmptyLogId));
        assert_eq!(LogId::try_from("B").unwrap().as_str(), "B");
    }

    #[test]
    fn ids_order_lexicographically() {
        let mut ids: Vec<LogId> = ["Z", "G", "Y"].into_iter().map(|s| LogId::new(s).unwrap()).collect();
        ids.sort();
        let names: Vec<&str> = ids.iter().map(LogId::as_str).collect();
        assert_eq!(names, vec!["G", "Y", "Z"]);
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&LogId::new("log-a").unwrap()).unwrap();
        assert_eq!(json, "\"log-a\"");
        let back: LogId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "log-a");
    }

    #[test]
    fn deserialize_rejects_empty_id() {
        assert!(serde_json::from_str::<LogId>("\"\"").is_err());
    }

    #[test]
    fn sequential_ids_are_deterministic() {
        let ids = SequentialIds::new("replica");
        assert_eq!(ids.next_id().as_str(), "replica-0");
        assert_eq!(ids.next_id().as_str(), "replica-1");
    }

    #[test]
    fn uuid_ids_are_unique() {
        let a = UuidIds.next_id();
        let b = UuidIds.next_id();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }
}
