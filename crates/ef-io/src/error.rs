//! Errors raised while talking to the search service or writing results.
//!
//! A remote job that finishes with a non-200 `completion_status` is not an
//! error; it is reported through [`ef_core::JobStatus`] instead.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use ef_core::{CoreError, JobHandle};

#[derive(Debug, Error)]
pub enum FanoutError {
    /// Transport-level failure (DNS, TLS, connect, timeout, body decode).
    #[error("request to search service failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("search service returned HTTP {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("invalid service URL '{url}': {reason}")]
    Url { url: String, reason: String },

    #[error("cannot read credentials from {path}: {reason}")]
    Credentials { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// Only raised when a wait ceiling was configured.
    #[error("job {handle} still running after {waited:?}")]
    WaitTimeout { handle: JobHandle, waited: Duration },
}
