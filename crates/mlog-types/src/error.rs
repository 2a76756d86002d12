//! Errors produced by the foundation types.

use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("empty log identifier")]
    EmptyLogId,

    #[error("clock of log {id} cannot advance past u64::MAX")]
    ClockOverflow { id: String },
}
