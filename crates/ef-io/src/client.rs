//! # Search Service Adapter
//!
//! The slice of the remote async-search API the fan-out needs. The trait is
//! stateless from the caller's side: every call is one request, and failures
//! are handed back unmodified. Nothing here retries.

use ef_core::{IndexName, JobHandle, JobStatus, QueryDocument, ResultPayload, SubmitResponse};

use crate::Result;

/// The async-search surface of the cluster.
///
/// Implemented by [`crate::elastic::ElasticClient`] for real clusters.
#[async_trait::async_trait]
pub trait SearchService: Send + Sync {
    /// Submit `query` against one index, letting the service answer inline
    /// if it finishes within `inline_timeout` (a service duration string
    /// such as `"1s"`).
    async fn submit(
        &self,
        index: &IndexName,
        query: &QueryDocument,
        inline_timeout: &str,
    ) -> Result<SubmitResponse>;

    /// One status snapshot of a running job.
    async fn poll_status(&self, handle: &JobHandle) -> Result<JobStatus>;

    /// The final result of a job. Only meaningful once it has stopped running.
    async fn fetch_result(&self, handle: &JobHandle) -> Result<ResultPayload>;

    /// Raw index catalog listing for `pattern`, one row per index.
    async fn list_indices(&self, pattern: &str) -> Result<String>;

    /// One-line cluster health summary.
    async fn health(&self) -> Result<String>;
}
