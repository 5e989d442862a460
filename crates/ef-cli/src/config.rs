//! Optional `eqlfan.toml`: tuning knobs that rarely change between runs.
//!
//! ```toml
//! [search]
//! inline_timeout = "1s"
//! request_timeout_secs = 360
//!
//! [poll]
//! interval_secs = 5
//! max_wait_secs = 0   # 0 waits forever
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default = "default_inline_timeout")]
    pub inline_timeout: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            inline_timeout: default_inline_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
    #[serde(default)]
    pub max_wait_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
            max_wait_secs: 0,
        }
    }
}

fn default_inline_timeout() -> String {
    ef_io::orchestrator::DEFAULT_INLINE_TIMEOUT.to_string()
}
fn default_request_timeout() -> u64 {
    ef_io::elastic::DEFAULT_REQUEST_TIMEOUT.as_secs()
}
fn default_poll_interval() -> u64 {
    ef_io::waiter::DEFAULT_POLL_INTERVAL.as_secs()
}

impl Config {
    /// Load `path` if it exists; a missing file means all defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.search.request_timeout_secs == 0 {
            bail!("[search] request_timeout_secs must be at least 1");
        }
        if self.poll.interval_secs == 0 {
            bail!("[poll] interval_secs must be at least 1");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.search.request_timeout_secs)
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        (self.max_wait_secs > 0).then(|| Duration::from_secs(self.max_wait_secs))
    }
}
