//! # ef-core — The data model of eqlfan
//!
//! Plain types shared by the fan-out engine and the CLI. Nothing in this
//! crate talks to the network or the filesystem.
//!
//! - [`QueryDocument`] — the opaque EQL search body, parsed from a literal.
//! - [`IndexName`] and [`catalog`] — concrete indices resolved from a pattern.
//! - [`JobHandle`], [`JobStatus`], [`SubmitResponse`] — async-search job state.
//! - [`output_path`] — where a per-index result lands on disk.

pub mod catalog;
pub mod error;
pub mod job;
pub mod literal;
pub mod query;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use error::CoreError;
pub use job::{JobHandle, JobStatus, ResultPayload, SubmitResponse, SUCCESS_STATUS};
pub use query::QueryDocument;

// =============================================================================
// Index Identifier
// =============================================================================

/// One concrete index in the cluster, e.g. `winlogbeat-2021.12.01`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexName(String);

impl IndexName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IndexName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Path a result for `index` is written to: `<prefix>_<index>.json`.
///
/// The prefix is used verbatim, so it may carry a directory part
/// (`results/q1` → `results/q1_logs-2024.01.01.json`).
pub fn output_path(prefix: &str, index: &IndexName) -> PathBuf {
    PathBuf::from(format!("{}_{}.json", prefix, index))
}

// =============================================================================
// Run Mode
// =============================================================================

/// How pending jobs are waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Wait for each job right after submitting it.
    Sequential,
    /// Submit every index first, then wait on the queued jobs in submission order.
    #[default]
    Parallel,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}
