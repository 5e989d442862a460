//! # Async-Search Jobs
//!
//! The three shapes the search service hands back during one index's life:
//! a submit response, a status snapshot, and a final result document.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// `completion_status` the service reports for a job that finished cleanly.
pub const SUCCESS_STATUS: u16 = 200;

/// Opaque id of a job still running on the service side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The final document for one index, written to disk as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultPayload(pub Value);

impl ResultPayload {
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

// =============================================================================
// Status
// =============================================================================

#[derive(Deserialize)]
struct StatusFields {
    is_running: bool,
    #[serde(default)]
    completion_status: Option<u16>,
}

/// One status poll. Only `is_running` and `completion_status` drive
/// decisions; the full document is kept so a failed job can be written out
/// exactly as the service described it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatus {
    pub is_running: bool,
    pub completion_status: Option<u16>,
    raw: Value,
}

impl JobStatus {
    pub fn from_value(raw: Value) -> Result<Self, CoreError> {
        let fields = StatusFields::deserialize(&raw).map_err(CoreError::MalformedStatus)?;
        Ok(Self {
            is_running: fields.is_running,
            completion_status: fields.completion_status,
            raw,
        })
    }

    /// A terminal status with `completion_status == 200`.
    pub fn is_success(&self) -> bool {
        !self.is_running && self.completion_status == Some(SUCCESS_STATUS)
    }

    /// The status document itself, used as the output for failed jobs.
    pub fn into_payload(self) -> ResultPayload {
        ResultPayload(self.raw)
    }
}

// =============================================================================
// Submit Response
// =============================================================================

/// What a submit call returned within its inline timeout.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResponse {
    /// The service finished inside the inline window; this is the result.
    Complete(ResultPayload),
    /// The job outlived the inline window and must be polled.
    Running(JobHandle),
}

impl SubmitResponse {
    /// Classify a raw submit response by its `is_running` flag.
    ///
    /// A response without `is_running` is treated as complete.
    pub fn classify(raw: Value) -> Result<Self, CoreError> {
        let running = raw
            .get("is_running")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !running {
            return Ok(Self::Complete(ResultPayload(raw)));
        }
        let id = raw
            .get("id")
            .and_then(Value::as_str)
            .ok_or(CoreError::MissingJobId)?;
        Ok(Self::Running(JobHandle::new(id)))
    }
}
