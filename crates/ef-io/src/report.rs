//! # Run Report
//!
//! What one fan-out run wrote, in write order. Saved as JSON with
//! `eqlfan run --report <path>`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use ef_core::{IndexName, RunMode};

use crate::{FanoutError, Result};

/// How an index reached its output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum IndexOutcome {
    /// Answered within the inline timeout; never polled.
    Inline,
    /// Ran as a job and finished with `completion_status == 200`.
    Succeeded,
    /// Ran as a job and finished with any other status. The status document
    /// was written instead of a result.
    Failed { completion_status: Option<u16> },
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub index: IndexName,
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: IndexOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub started_at: String,
    pub finished_at: String,
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub(crate) fn new(mode: RunMode) -> Self {
        Self {
            mode,
            started_at: chrono::Utc::now().to_rfc3339(),
            finished_at: String::new(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, index: IndexName, path: PathBuf, outcome: IndexOutcome) {
        self.entries.push(ReportEntry {
            index,
            path,
            outcome,
        });
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = chrono::Utc::now().to_rfc3339();
        self
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn succeeded(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, IndexOutcome::Inline | IndexOutcome::Succeeded))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, IndexOutcome::Failed { .. }))
            .count()
    }

    /// Indices in the order their files were written.
    pub fn written_order(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.index.as_str()).collect()
    }

    /// Write the report as pretty JSON, replacing any existing file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, text)
            .await
            .map_err(|source| FanoutError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}
