//! # ef-io — The fan-out engine of eqlfan
//!
//! Everything that touches the search service or the disk.
//!
//! - [`client::SearchService`] — the async-search API surface, and
//!   [`elastic::ElasticClient`], its HTTP implementation.
//! - [`waiter::Waiter`] — fixed-interval polling until a job stops running.
//! - [`enumerator::resolve`] — index pattern → concrete ordered index list.
//! - [`orchestrator::Orchestrator`] — per-index submit / wait / write.
//! - [`sink::ResultSink`] — one pretty-printed JSON file per index.

pub mod client;
pub mod credentials;
pub mod elastic;
pub mod enumerator;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod sink;
pub mod waiter;

#[cfg(test)]
pub(crate) mod fake;

pub use error::FanoutError;

pub type Result<T, E = FanoutError> = std::result::Result<T, E>;
