//! Lamport clocks for ordering entries across writers.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::LogId;

/// Lamport clock owned by a single log.
///
/// A pure value: [`tick`](Self::tick) and [`merge`](Self::merge) return new
/// clocks and leave `self` untouched, so a clock handed to a new log is copied,
/// never aliased.
///
/// Ordering: `time` → `id` (total order).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LamportClock {
    /// Identifier of the replica (log) owning this clock.
    pub id: LogId,
    /// Logical time. Never decreases for a given replica.
    pub time: u64,
}

impl LamportClock {
    /// Create a clock with an explicit time.
    pub fn new(id: LogId, time: u64) -> Self {
        Self { id, time }
    }

    /// A fresh clock at time zero.
    pub fn zero(id: LogId) -> Self {
        Self::new(id, 0)
    }

    /// The clock for the next local event.
    ///
    /// Fails with [`TypeError::ClockOverflow`] once `time` has reached
    /// `u64::MAX`.
    pub fn tick(&self) -> Result<Self, TypeError> {
        let time = self.time.checked_add(1).ok_or_else(|| TypeError::ClockOverflow {
            id: self.id.to_string(),
        })?;
        Ok(Self {
            id: self.id.clone(),
            time,
        })
    }

    /// Observe another clock: keep our id, take the later time.
    pub fn merge(&self, other: &LamportClock) -> Self {
        Self {
            id: self.id.clone(),
            time: self.time.max(other.time),
        }
    }
}

impl PartialOrd for LamportClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LamportClock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Debug for LamportClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LamportClock({}@{})", self.id, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn clock(id: &str, time: u64) -> LamportClock {
        LamportClock::new(LogId::new(id).unwrap(), time)
    }

    #[test]
    fn zero_clock() {
        let clock = LamportClock::zero(LogId::new("A").unwrap());
        assert_eq!(clock.time, 0);
        assert_eq!(clock.id.as_str(), "A");
    }

    #[test]
    fn tick_increments_by_one_without_mutating() {
        let clock = clock("A", 4);
        let next = clock.tick().unwrap();
        assert_eq!(clock.time, 4);
        assert_eq!(next.time, 5);
        assert_eq!(next.id, clock.id);
    }

    #[test]
    fn tick_at_max_time_overflows() {
        let last = clock("A", u64::MAX);
        assert_eq!(
            last.tick(),
            Err(TypeError::ClockOverflow { id: "A".into() })
        );
        assert_eq!(clock("A", u64::MAX - 1).tick().unwrap().time, u64::MAX);
    }

    #[test]
    fn merge_keeps_id_and_takes_max_time() {
        let a = clock("A", 2);
        let b = clock("B", 7);
        let merged = a.merge(&b);
        assert_eq!(merged.id.as_str(), "A");
        assert_eq!(merged.time, 7);

        let back = b.merge(&a);
        assert_eq!(back.id.as_str(), "B");
        assert_eq!(back.time, 7);
    }

    #[test]
    fn ordering_is_time_then_id() {
        let a1 = clock("A", 1);
        let b1 = clock("B", 1);
        let a2 = clock("A", 2);
        assert!(a1 < b1);
        assert!(b1 < a2);
    }

    proptest! {
        #[test]
        fn merge_is_monotonic(t1 in 0u64..10_000, t2 in 0u64..10_000) {
            let a = clock("A", t1);
            let b = clock("B", t2);
            let merged = a.merge(&b);
            prop_assert!(merged.time >= a.time);
            prop_assert!(merged.time >= b.time);
            prop_assert_eq!(merged.time, a.merge(&b).merge(&b).time);
        }
    }
}
