//! Loading entry graphs out of the object store.
//!
//! Replicas exchange only head hashes; everything behind a head is pulled on
//! demand by walking `next` references through the [`ObjectStore`]. The
//! [`LogLoader`] does that walk breadth-first, stops at a limit, skips
//! entries the caller already holds, and gives up on any single object that
//! does not arrive within the configured timeout instead of failing the
//! whole traversal.
//!
//! [`ObjectStore`]: mlog_store::ObjectStore

pub mod config;
pub mod loader;

pub use config::LoaderConfig;
pub use loader::{FetchOptions, LogLoader, ProgressFn};
