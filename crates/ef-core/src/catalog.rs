//! # Index Catalog Rows
//!
//! Parses the plain-text listing returned by `GET /_cat/indices/<pattern>`.
//! Each row is whitespace-delimited and the index name is the third column:
//!
//! ```text
//! green open winlogbeat-2021.12.01 3fG1...Aq 1 1 104823 0 88.1mb 44mb
//! ```
//!
//! Nothing outside this module depends on the row layout.

use crate::error::CoreError;
use crate::IndexName;

/// Zero-based column that holds the index name.
pub const INDEX_COLUMN: usize = 2;

/// Extract index names from a catalog listing, in listing order.
///
/// Blank lines are skipped, so an empty listing yields an empty list.
pub fn parse_rows(listing: &str) -> Result<Vec<IndexName>, CoreError> {
    let mut indices = Vec::new();
    for (n, row) in listing.lines().enumerate() {
        if row.trim().is_empty() {
            continue;
        }
        let name = row
            .split_whitespace()
            .nth(INDEX_COLUMN)
            .ok_or_else(|| CoreError::MalformedCatalogRow {
                line: n + 1,
                row: row.to_string(),
            })?;
        indices.push(IndexName::new(name));
    }
    Ok(indices)
}
