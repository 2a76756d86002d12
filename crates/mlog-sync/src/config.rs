//! Loader configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning knobs for [`LogLoader`](crate::LogLoader).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// How long a single object read may take before its branch is skipped.
    pub fetch_timeout_ms: u64,
    /// Maximum number of chains fetched at once by `fetch_parallel`.
    /// `None` fetches every starting hash at once.
    pub concurrency: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 2000,
            concurrency: None,
        }
    }
}

impl LoaderConfig {
    /// The per-object fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
