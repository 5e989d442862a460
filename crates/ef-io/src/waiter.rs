//! # Completion Waiter
//!
//! Blocks the calling task until a job stops running, polling at a fixed
//! interval. There is no ceiling unless one is configured: a job the service
//! never finishes stalls the caller indefinitely.
//!
//! A job that finishes with a non-200 `completion_status` is a normal
//! outcome. It is logged as failed and returned like any other status.

use std::time::Duration;

use tokio::time::Instant;

use ef_core::{JobHandle, JobStatus};

use crate::client::SearchService;
use crate::{FanoutError, Result};

/// Default delay between two status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest delay the waiter will ever sleep between polls.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct WaitPolicy {
    pub interval: Duration,
    /// `None` waits forever.
    pub max_wait: Option<Duration>,
    /// Emit a progress line on every poll.
    pub verbose: bool,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
            verbose: true,
        }
    }
}

pub struct Waiter<'a, C: SearchService + ?Sized> {
    client: &'a C,
    policy: WaitPolicy,
}

impl<'a, C: SearchService + ?Sized> Waiter<'a, C> {
    pub fn new(client: &'a C, policy: WaitPolicy) -> Self {
        Self { client, policy }
    }

    /// Wait until `handle` is no longer running and return its terminal
    /// status, read by one final status query after the loop.
    pub async fn wait(&self, handle: &JobHandle) -> Result<JobStatus> {
        let interval = self.policy.interval.max(MIN_POLL_INTERVAL);
        let started = Instant::now();
        let mut status = self.client.poll_status(handle).await?;
        let mut ticks: u32 = 0;

        while status.is_running {
            if let Some(max_wait) = self.policy.max_wait {
                let waited = started.elapsed();
                if waited >= max_wait {
                    return Err(FanoutError::WaitTimeout {
                        handle: handle.clone(),
                        waited,
                    });
                }
            }

            tokio::time::sleep(interval).await;
            ticks += 1;
            status = self.client.poll_status(handle).await?;

            if self.policy.verbose {
                tracing::warn!(
                    "Waiting for {} completion: {}s",
                    handle,
                    (interval * ticks).as_secs()
                );
            }
        }

        let status = self.client.poll_status(handle).await?;
        if status.is_success() {
            tracing::warn!("{} succeeded", handle);
        } else {
            tracing::warn!(
                "{} failed (completion_status: {})",
                handle,
                status
                    .completion_status
                    .map_or_else(|| "missing".to_string(), |c| c.to_string())
            );
        }
        Ok(status)
    }
}
