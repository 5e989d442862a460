//! Scripted in-memory search service for tests.
//!
//! Each registered index either answers inline or becomes a job that stops
//! running a fixed (virtual) delay after it was submitted. Every call is
//! recorded so tests can assert on what was asked, and in which order.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;

use ef_core::{IndexName, JobHandle, JobStatus, QueryDocument, ResultPayload, SubmitResponse};

use crate::client::SearchService;
use crate::{FanoutError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum FakeCall {
    ListIndices(String),
    Submit(String, Value),
    Status(String),
    Fetch(String),
    Health,
}

#[derive(Debug, Clone)]
enum Script {
    Inline(Value),
    Job { delay: Duration, completion_status: u16 },
    SubmitError(u16),
}

#[derive(Default)]
pub struct FakeSearch {
    order: Vec<String>,
    scripts: HashMap<String, Script>,
    submitted: Mutex<HashMap<String, (String, Instant)>>,
    calls: Mutex<Vec<FakeCall>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(mut self, index: &str, script: Script) -> Self {
        self.order.push(index.to_string());
        self.scripts.insert(index.to_string(), script);
        self
    }

    /// An index whose submit answers with `payload` right away.
    pub fn inline(self, index: &str, payload: Value) -> Self {
        self.register(index, Script::Inline(payload))
    }

    /// An index whose submit starts a job that finishes `delay` later.
    pub fn job(self, index: &str, delay: Duration, completion_status: u16) -> Self {
        self.register(
            index,
            Script::Job {
                delay,
                completion_status,
            },
        )
    }

    /// An index whose submit request itself is rejected with `status`.
    pub fn submit_error(self, index: &str, status: u16) -> Self {
        self.register(index, Script::SubmitError(status))
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&FakeCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(*c)).count()
    }

    fn record(&self, call: FakeCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// The deterministic result document of a finished job.
    pub fn result_for(index: &str) -> Value {
        json!({
            "id": format!("job-{}", index),
            "is_running": false,
            "is_partial": false,
            "took": 42,
            "hits": {"total": {"value": 1}, "events": [{"_index": index}]}
        })
    }

    fn lookup(&self, handle: &JobHandle) -> Result<(String, bool, u16)> {
        let submitted = self.submitted.lock().unwrap();
        let (index, at) = submitted.get(handle.as_str()).ok_or_else(|| FanoutError::Status {
            endpoint: format!("/_eql/search/{}", handle),
            status: 404,
            body: r#"{"error":"resource_not_found_exception"}"#.into(),
        })?;
        match self.scripts.get(index) {
            Some(Script::Job {
                delay,
                completion_status,
            }) => Ok((index.clone(), Instant::now() < *at + *delay, *completion_status)),
            _ => unreachable!("only job scripts hand out handles"),
        }
    }
}

#[async_trait::async_trait]
impl SearchService for FakeSearch {
    async fn submit(
        &self,
        index: &IndexName,
        query: &QueryDocument,
        _inline_timeout: &str,
    ) -> Result<SubmitResponse> {
        self.record(FakeCall::Submit(index.to_string(), query.as_value().clone()));
        match self.scripts.get(index.as_str()) {
            Some(Script::Inline(payload)) => Ok(SubmitResponse::Complete(ResultPayload(payload.clone()))),
            Some(Script::Job { .. }) => {
                let id = format!("job-{}", index);
                self.submitted
                    .lock()
                    .unwrap()
                    .insert(id.clone(), (index.to_string(), Instant::now()));
                Ok(SubmitResponse::classify(
                    json!({"id": id, "is_running": true, "is_partial": true}),
                )?)
            }
            Some(Script::SubmitError(status)) => Err(FanoutError::Status {
                endpoint: format!("/{}/_eql/search", index),
                status: *status,
                body: r#"{"error":"search_phase_execution_exception"}"#.into(),
            }),
            None => Err(FanoutError::Status {
                endpoint: format!("/{}/_eql/search", index),
                status: 404,
                body: r#"{"error":"index_not_found_exception"}"#.into(),
            }),
        }
    }

    async fn poll_status(&self, handle: &JobHandle) -> Result<JobStatus> {
        self.record(FakeCall::Status(handle.to_string()));
        let (_, running, completion_status) = self.lookup(handle)?;
        let raw = if running {
            json!({"id": handle.as_str(), "is_running": true, "is_partial": true})
        } else {
            json!({
                "id": handle.as_str(),
                "is_running": false,
                "is_partial": completion_status != 200,
                "completion_status": completion_status
            })
        };
        Ok(JobStatus::from_value(raw)?)
    }

    async fn fetch_result(&self, handle: &JobHandle) -> Result<ResultPayload> {
        self.record(FakeCall::Fetch(handle.to_string()));
        let (index, running, _) = self.lookup(handle)?;
        if running {
            return Err(FanoutError::Status {
                endpoint: format!("/_eql/search/{}", handle),
                status: 409,
                body: "still running".into(),
            });
        }
        Ok(ResultPayload(Self::result_for(&index)))
    }

    async fn list_indices(&self, pattern: &str) -> Result<String> {
        self.record(FakeCall::ListIndices(pattern.to_string()));
        Ok(self
            .order
            .iter()
            .enumerate()
            .map(|(i, name)| format!("green open {} uuid{} 1 1 100 0 1mb 512kb\n", name, i))
            .collect())
    }

    async fn health(&self) -> Result<String> {
        self.record(FakeCall::Health);
        Ok("1700000000 00:00:00 fake-cluster green 1 1 3 3 0 0 0 0 - 100.0%".into())
    }
}
