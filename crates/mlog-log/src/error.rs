//! Errors surfaced by log operations.

use mlog_dag::DagError;
use mlog_store::StoreError;
use mlog_types::{ContentId, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("at least one log is required")]
    LogRequired,

    #[error("not a log: {0}")]
    NotALog(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("can't serialize an empty log")]
    EmptyLog,

    #[error("can't serialize a log without heads")]
    NoHeads,

    #[error("not found: {0}")]
    NotFound(ContentId),

    #[error("entry error: {0}")]
    Dag(DagError),
}

impl From<DagError> for LogError {
    fn from(e: DagError) -> Self {
        match e {
            DagError::Store(e) => LogError::StoreUnavailable(e),
            DagError::Clock(e) => e.into(),
            other => LogError::Dag(other),
        }
    }
}

impl From<TypeError> for LogError {
    fn from(e: TypeError) -> Self {
        LogError::InvalidArgument(e.to_string())
    }
}

pub type LogResult<T> = Result<T, LogError>;
