//! Error types for entry encoding and fetching.

use mlog_store::StoreError;
use mlog_types::{ContentId, TypeError};

/// Errors that can occur while creating, encoding or decoding entries.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// A stored object does not decode into a well-formed entry.
    #[error("invalid entry {hash}: {reason}")]
    InvalidEntry {
        /// Identifier the object was read under.
        hash: ContentId,
        /// What is wrong with it.
        reason: String,
    },

    /// The object store rejected a read or write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The writing log's clock cannot advance.
    #[error(transparent)]
    Clock(#[from] TypeError),

    /// Serialization of an entry record failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
