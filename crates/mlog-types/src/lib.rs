//! Foundation types for the Merkle log.
//!
//! Every other `mlog` crate depends on `mlog-types`.
//!
//! # Key Types
//!
//! - [`ContentId`] -- Content-addressed identifier (BLAKE3 hash) of a stored object
//! - [`LogId`] -- Identifier of a log (and of the replica that writes to it)
//! - [`LamportClock`] -- Per-replica logical clock used to order entries
//! - [`IdGenerator`] -- Injected source of fresh log identifiers

pub mod clock;
pub mod error;
pub mod identity;
pub mod object;

pub use clock::LamportClock;
pub use error::TypeError;
pub use identity::{IdGenerator, LogId, SequentialIds, UuidIds};
pub use object::ContentId;
