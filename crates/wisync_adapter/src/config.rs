//! Configuration for the sync adapter.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded retry with a fixed backoff between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    /// Wait before each retry.
    #[serde(rename = "backoff_ms", with = "duration_ms")]
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Returns the wait before the next attempt, or `None` once
    /// `attempts_made` has used up the budget.
    pub fn next_delay(&self, attempts_made: u32) -> Option<Duration> {
        if attempts_made < self.max_attempts.max(1) {
            Some(self.backoff)
        } else {
            None
        }
    }
}

/// Configuration for a [`SyncAdapter`](crate::SyncAdapter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Retry policy for reading a record during refresh.
    pub read_retry: RetryPolicy,
    /// Retry policy for saving a record.
    pub write_retry: RetryPolicy,
    /// Pause taken after an ignored format error.
    #[serde(rename = "format_error_pause_ms", with = "duration_ms")]
    pub format_error_pause: Duration,
    /// Minimum time between progress lines during bulk wraps.
    #[serde(rename = "progress_interval_ms", with = "duration_ms")]
    pub progress_interval: Duration,
}

impl AdapterConfig {
    /// Creates the default configuration: one retry after 8 s for reads, one
    /// retry after 10 s for writes, a 10 s pause on format errors and a
    /// progress line at most every 5 s.
    pub fn new() -> Self {
        Self {
            read_retry: RetryPolicy::new(2, Duration::from_secs(8)),
            write_retry: RetryPolicy::new(2, Duration::from_secs(10)),
            format_error_pause: Duration::from_secs(10),
            progress_interval: Duration::from_secs(5),
        }
    }

    /// Sets the read retry policy.
    pub fn with_read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }

    /// Sets the write retry policy.
    pub fn with_write_retry(mut self, policy: RetryPolicy) -> Self {
        self.write_retry = policy;
        self
    }

    /// Sets the pause after an ignored format error.
    pub fn with_format_error_pause(mut self, pause: Duration) -> Self {
        self.format_error_pause = pause;
        self
    }

    /// Sets the progress interval.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Connection settings for a team project endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamProjectConfig {
    /// Collection URL.
    pub collection: String,
    /// Project name.
    pub project: String,
}

impl TeamProjectConfig {
    /// Creates a team project configuration.
    pub fn new(collection: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            project: project.into(),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
