//! # Index Enumerator
//!
//! Pattern → the concrete indices the cluster has right now, in the order
//! its catalog lists them. Resolved once per run.

use ef_core::{catalog, IndexName};

use crate::client::SearchService;
use crate::Result;

/// Resolve `pattern` (e.g. `winlogbeat-2021.12.0*`) to concrete indices.
///
/// A pattern matching nothing yields an empty list, not an error.
pub async fn resolve<C: SearchService + ?Sized>(client: &C, pattern: &str) -> Result<Vec<IndexName>> {
    let listing = client.list_indices(pattern).await?;
    let indices = catalog::parse_rows(&listing)?;
    tracing::debug!("pattern '{}' resolved to {} indices", pattern, indices.len());
    Ok(indices)
}
