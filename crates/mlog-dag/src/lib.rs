//! The entry graph of the Merkle log.
//!
//! An [`Entry`] is an immutable, content-addressed node: one payload plus the
//! [`ContentId`]s of its causal parents. An [`EntrySet`] is a grow-only set of
//! entries with set algebra (merge, difference, intersection), derived views
//! (heads, tails, tail hashes) and the canonical linearization that makes
//! every replica agree on the order of the same entries.
//!
//! [`ContentId`]: mlog_types::ContentId

pub mod entry;
pub mod entry_set;
pub mod error;

pub use entry::{Entry, ENTRY_VERSION};
pub use entry_set::EntrySet;
pub use error::{DagError, DagResult};
