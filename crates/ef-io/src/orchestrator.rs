//! # Fan-Out Orchestrator
//!
//! Runs one query against every index a pattern resolves to. Each index
//! moves through:
//!
//! ```text
//! SUBMITTED --(inline complete)--> DONE
//! SUBMITTED --(still running)----> PENDING
//! PENDING   --(sequential)--------> WAITING --> DONE
//! PENDING   --(parallel)----------> QUEUED  --> WAITING --> DONE
//! ```
//!
//! Everything runs on the caller's task, so at most one request is in flight.
//! In parallel mode the queue is filled completely before it is drained, and
//! it is drained in submission order regardless of which job finishes first.
//!
//! Any request or write failure aborts the run. A job that finishes with a
//! non-200 status still gets its status document written.

use ef_core::{IndexName, JobHandle, QueryDocument, RunMode, SubmitResponse};

use crate::client::SearchService;
use crate::enumerator;
use crate::report::{IndexOutcome, RunReport};
use crate::sink::ResultSink;
use crate::waiter::{WaitPolicy, Waiter};
use crate::Result;

/// `wait_for_completion_timeout` sent with every submission.
pub const DEFAULT_INLINE_TIMEOUT: &str = "1s";

#[derive(Debug, Clone)]
pub struct FanoutConfig {
    pub mode: RunMode,
    pub inline_timeout: String,
    pub wait: WaitPolicy,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            inline_timeout: DEFAULT_INLINE_TIMEOUT.to_string(),
            wait: WaitPolicy::default(),
        }
    }
}

pub struct Orchestrator<'a, C: SearchService + ?Sized> {
    client: &'a C,
    config: FanoutConfig,
    sink: ResultSink,
}

impl<'a, C: SearchService + ?Sized> Orchestrator<'a, C> {
    pub fn new(client: &'a C, config: FanoutConfig, sink: ResultSink) -> Self {
        Self {
            client,
            config,
            sink,
        }
    }

    /// Resolve `pattern`, then submit, wait and write for every index.
    pub async fn run(&self, pattern: &str, query: &QueryDocument) -> Result<RunReport> {
        let indices = enumerator::resolve(self.client, pattern).await?;
        tracing::warn!("Total indices to query: {}", indices.len());
        self.run_indices(&indices, query).await
    }

    /// Fan out over an already-resolved index list.
    pub async fn run_indices(&self, indices: &[IndexName], query: &QueryDocument) -> Result<RunReport> {
        let mut report = RunReport::new(self.config.mode);
        let mut queued: Vec<(IndexName, JobHandle)> = Vec::new();

        for index in indices {
            let response = self
                .client
                .submit(index, query, &self.config.inline_timeout)
                .await?;

            match response {
                SubmitResponse::Complete(payload) => {
                    let path = self.sink.write(index, &payload).await?;
                    tracing::warn!("Results acquired for {}. Saved to: {}", index, path.display());
                    report.record(index.clone(), path, IndexOutcome::Inline);
                }
                SubmitResponse::Running(handle) => {
                    tracing::warn!(
                        "Instantiated job for {} and running in background with job ID: {}",
                        index,
                        handle
                    );
                    match self.config.mode {
                        RunMode::Sequential => self.settle(index, &handle, &mut report).await?,
                        RunMode::Parallel => queued.push((index.clone(), handle)),
                    }
                }
            }
        }

        for (index, handle) in &queued {
            self.settle(index, handle, &mut report).await?;
        }

        Ok(report.finish())
    }

    /// WAITING → DONE for one job.
    async fn settle(&self, index: &IndexName, handle: &JobHandle, report: &mut RunReport) -> Result<()> {
        let status = Waiter::new(self.client, self.config.wait.clone())
            .wait(handle)
            .await?;

        let (payload, outcome) = if status.is_success() {
            (self.client.fetch_result(handle).await?, IndexOutcome::Succeeded)
        } else {
            let completion_status = status.completion_status;
            (status.into_payload(), IndexOutcome::Failed { completion_status })
        };

        let path = self.sink.write(index, &payload).await?;
        tracing::warn!("Results acquired for {}. Saved to: {}", index, path.display());
        report.record(index.clone(), path, outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeCall, FakeSearch};
    use crate::FanoutError;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::time::Duration;
    use tokio::time::Instant;

    fn query() -> QueryDocument {
        QueryDocument::from_value(json!({"query": "process where process.name == \"cmd.exe\"", "size": 10}))
            .unwrap()
    }

    fn config(mode: RunMode) -> FanoutConfig {
        FanoutConfig {
            mode,
            inline_timeout: "1s".into(),
            wait: WaitPolicy {
                interval: Duration::from_secs(5),
                max_wait: None,
                verbose: false,
            },
        }
    }

    fn sink_in(dir: &Path) -> ResultSink {
        ResultSink::new(dir.join("out").display().to_string())
    }

    /// a: slow job, b: inline, c: fast job, d: failing job.
    fn mixed() -> FakeSearch {
        FakeSearch::new()
            .job("a", Duration::from_secs(10), 200)
            .inline("b", json!({"is_running": false, "hits": {"events": []}}))
            .job("c", Duration::ZERO, 200)
            .job("d", Duration::from_secs(5), 500)
    }

    fn read_outputs(dir: &Path) -> BTreeMap<String, Vec<u8>> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .map(|p| {
                let name = p.file_name().unwrap().to_string_lossy().to_string();
                (name, std::fs::read(&p).unwrap())
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_index_written_exactly_once() {
        for mode in [RunMode::Sequential, RunMode::Parallel] {
            let dir = tempfile::tempdir().unwrap();
            let fake = mixed();
            let report = Orchestrator::new(&fake, config(mode), sink_in(dir.path()))
                .run("logs-*", &query())
                .await
                .unwrap();

            assert_eq!(report.total(), 4);
            let outputs = read_outputs(dir.path());
            let names: Vec<&str> = outputs.keys().map(String::as_str).collect();
            assert_eq!(names, vec!["out_a.json", "out_b.json", "out_c.json", "out_d.json"]);
            for entry in &report.entries {
                assert_eq!(entry.path, dir.path().join(format!("out_{}.json", entry.index)));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_and_parallel_outputs_are_identical() {
        let seq_dir = tempfile::tempdir().unwrap();
        let par_dir = tempfile::tempdir().unwrap();

        let seq_fake = mixed();
        Orchestrator::new(&seq_fake, config(RunMode::Sequential), sink_in(seq_dir.path()))
            .run("logs-*", &query())
            .await
            .unwrap();
        let par_fake = mixed();
        Orchestrator::new(&par_fake, config(RunMode::Parallel), sink_in(par_dir.path()))
            .run("logs-*", &query())
            .await
            .unwrap();

        assert_eq!(read_outputs(seq_dir.path()), read_outputs(par_dir.path()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inline_completion_skips_polling() {
        let dir = tempfile::tempdir().unwrap();
        let payload = json!({"is_running": false, "took": 3, "hits": {"events": [{"_id": "1"}]}});
        let fake = FakeSearch::new().inline("b", payload.clone());

        let report = Orchestrator::new(&fake, config(RunMode::Parallel), sink_in(dir.path()))
            .run("b", &query())
            .await
            .unwrap();

        assert_eq!(report.entries[0].outcome, IndexOutcome::Inline);
        assert_eq!(fake.count(|c| matches!(c, FakeCall::Status(_) | FakeCall::Fetch(_))), 0);
        let written: Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("out_b.json")).unwrap()).unwrap();
        assert_eq!(written, payload);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_writes_follow_enumeration_order() {
        let dir = tempfile::tempdir().unwrap();
        // c finishes first on the service side, a last.
        let fake = FakeSearch::new()
            .job("a", Duration::from_secs(10), 200)
            .job("b", Duration::from_secs(5), 200)
            .job("c", Duration::ZERO, 200);

        let report = Orchestrator::new(&fake, config(RunMode::Parallel), sink_in(dir.path()))
            .run("*", &query())
            .await
            .unwrap();

        assert_eq!(report.written_order(), vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_submits_everything_before_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeSearch::new()
            .job("a", Duration::from_secs(10), 200)
            .job("b", Duration::from_secs(5), 200);

        Orchestrator::new(&fake, config(RunMode::Parallel), sink_in(dir.path()))
            .run("*", &query())
            .await
            .unwrap();

        let calls = fake.calls();
        assert!(matches!(&calls[1], FakeCall::Submit(i, _) if i == "a"));
        assert!(matches!(&calls[2], FakeCall::Submit(i, _) if i == "b"));
        assert!(calls[3..].iter().all(|c| !matches!(c, FakeCall::Submit(..))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_waits_before_next_submit() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeSearch::new()
            .job("a", Duration::from_secs(10), 200)
            .job("b", Duration::from_secs(5), 200);
        let start = Instant::now();

        Orchestrator::new(&fake, config(RunMode::Sequential), sink_in(dir.path()))
            .run("*", &query())
            .await
            .unwrap();

        let calls = fake.calls();
        let submit_b = calls
            .iter()
            .position(|c| matches!(c, FakeCall::Submit(i, _) if i == "b"))
            .unwrap();
        let fetch_a = calls
            .iter()
            .position(|c| matches!(c, FakeCall::Fetch(h) if h == "job-a"))
            .unwrap();
        assert!(fetch_a < submit_b);
        // a takes 10s, then b is submitted and takes another 5s.
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_is_passed_verbatim_to_every_index() {
        let dir = tempfile::tempdir().unwrap();
        let fake = mixed();
        Orchestrator::new(&fake, config(RunMode::Parallel), sink_in(dir.path()))
            .run("logs-*", &query())
            .await
            .unwrap();

        let bodies: Vec<Value> = fake
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Submit(_, body) => Some(body),
                _ => None,
            })
            .collect();
        assert_eq!(bodies.len(), 4);
        assert!(bodies.iter().all(|b| b == query().as_value()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_writes_status_document() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeSearch::new().job("d", Duration::from_secs(5), 500);

        let report = Orchestrator::new(&fake, config(RunMode::Sequential), sink_in(dir.path()))
            .run("d", &query())
            .await
            .unwrap();

        assert_eq!(
            report.entries[0].outcome,
            IndexOutcome::Failed {
                completion_status: Some(500)
            }
        );
        assert_eq!(report.failed(), 1);
        assert_eq!(fake.count(|c| matches!(c, FakeCall::Fetch(_))), 0);
        let written: Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("out_d.json")).unwrap()).unwrap();
        assert_eq!(written["completion_status"], json!(500));
        assert_eq!(written["is_running"], json!(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_job_writes_fetched_result() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeSearch::new().job("a", Duration::from_secs(7), 200);

        Orchestrator::new(&fake, config(RunMode::Parallel), sink_in(dir.path()))
            .run("a", &query())
            .await
            .unwrap();

        let written: Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("out_a.json")).unwrap()).unwrap();
        assert_eq!(written, FakeSearch::result_for("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_pattern_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeSearch::new();

        let report = Orchestrator::new(&fake, config(RunMode::Parallel), sink_in(dir.path()))
            .run("nothing-*", &query())
            .await
            .unwrap();

        assert_eq!(report.total(), 0);
        assert!(read_outputs(dir.path()).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_failure_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeSearch::new()
            .inline("a", json!({"is_running": false}))
            .submit_error("b", 400)
            .inline("c", json!({"is_running": false}));

        let err = Orchestrator::new(&fake, config(RunMode::Parallel), sink_in(dir.path()))
            .run("*", &query())
            .await
            .unwrap_err();

        assert!(matches!(err, FanoutError::Status { status: 400, .. }));
        let outputs = read_outputs(dir.path());
        assert!(outputs.contains_key("out_a.json"));
        assert!(!outputs.contains_key("out_c.json"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_failure_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeSearch::new().inline("a", json!({"is_running": false}));
        let sink = ResultSink::new(dir.path().join("no/such/dir/out").display().to_string());

        let err = Orchestrator::new(&fake, config(RunMode::Sequential), sink)
            .run("a", &query())
            .await
            .unwrap_err();
        assert!(matches!(err, FanoutError::Io { .. }));
    }
}
