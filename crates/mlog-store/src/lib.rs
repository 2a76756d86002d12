//! Content-addressed object storage for the Merkle log.
//!
//! The log never talks to a network or disk directly. Everything it persists
//! (entries and log descriptors) goes through the [`ObjectStore`] trait: `put`
//! immutable bytes, get back a [`ContentId`], and later `get` the bytes by that
//! identifier.
//!
//! # Storage Backends
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`LatencyStore`] -- wrapper adding read/write delay and stalled objects,
//!   used to exercise fetch timeouts
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Identical bytes yield identical identifiers.
//! 3. Concurrent reads are always safe (objects are immutable).
//! 4. The store never interprets object contents.
//!
//! [`ContentId`]: mlog_types::ContentId

pub mod error;
pub mod hasher;
pub mod latency;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use hasher::ContentHasher;
pub use latency::LatencyStore;
pub use memory::InMemoryObjectStore;
pub use traits::ObjectStore;
