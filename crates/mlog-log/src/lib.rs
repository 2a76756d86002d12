//! An append-only, multi-writer Merkle log.
//!
//! Every replica of a log holds an immutable [`Log`] value: an id, a Lamport
//! clock, a grow-only set of content-addressed entries and its current heads.
//! Replicas never coordinate. They exchange descriptors (`{id, heads}`),
//! load whatever history they need from the object store, and merge with
//! [`Log::join`], which converges to the same entry order everywhere no
//! matter in which order logs are joined.
//!
//! # Example
//!
//! ```ignore
//! let replica = Replica::new(Arc::new(InMemoryObjectStore::new()));
//! let a = replica.append(&Log::new("A")?, json!("one")).await?;
//! let b = replica.append(&Log::new("B")?, json!("two")).await?;
//! let joined = Log::join(&a, &b, None, None)?;
//! let hash = replica.to_multihash(&joined).await?;
//! let loaded = replica.from_multihash(&hash, FetchOptions::new()).await?;
//! assert_eq!(loaded, joined);
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod log;
pub mod replica;

pub use config::ReplicaConfig;
pub use descriptor::LogDescriptor;
pub use error::{LogError, LogResult};
pub use log::{Log, LogOptions};
pub use replica::Replica;

// Re-export the types that appear in this crate's public API.
pub use mlog_dag::{Entry, EntrySet};
pub use mlog_store::{InMemoryObjectStore, ObjectStore};
pub use mlog_sync::{FetchOptions, LoaderConfig, ProgressFn};
pub use mlog_types::{ContentId, IdGenerator, LamportClock, LogId, SequentialIds, UuidIds};
