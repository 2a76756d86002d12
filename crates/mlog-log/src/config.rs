//! Replica configuration, loadable from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use mlog_dag::ENTRY_VERSION;
use mlog_sync::LoaderConfig;

use crate::error::{LogError, LogResult};

/// Configuration for a [`Replica`](crate::Replica).
///
/// ```toml
/// entry_version = 1
///
/// [loader]
/// fetch_timeout_ms = 2000
/// concurrency = 8
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicaConfig {
    /// Loader settings used by expand and the reconstruction operations.
    pub loader: LoaderConfig,
    /// Schema version stamped on appended entries.
    pub entry_version: u32,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            entry_version: ENTRY_VERSION,
        }
    }
}

impl ReplicaConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> LogResult<Self> {
        toml::from_str(s).map_err(|e| LogError::InvalidArgument(format!("invalid config: {e}")))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LogError::InvalidArgument(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }
}
