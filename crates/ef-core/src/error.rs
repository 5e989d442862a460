//! Error types for the data model.

use thiserror::Error;

/// A query literal that could not be parsed, with the 1-based position of
/// the offending character.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query literal error at line {line}, column {column}: {message}")]
pub struct QueryParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    QueryParse(#[from] QueryParseError),

    /// The query literal parsed, but does not describe a search body.
    #[error("query document must be a mapping, got {0}")]
    QueryNotMapping(&'static str),

    /// A catalog row with fewer than three columns.
    #[error("catalog row {line} has no index column: {row:?}")]
    MalformedCatalogRow { line: usize, row: String },

    /// The service reported a running job without an id to poll.
    #[error("submit response is running but carries no job id")]
    MissingJobId,

    #[error("malformed job status: {0}")]
    MalformedStatus(#[source] serde_json::Error),
}
