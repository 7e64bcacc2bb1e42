use crate::retry::RetryPolicy;
use model::definition::DEFAULT_RETRY_BUDGET;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs shared by every table initializer of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Whole-sequence attempts for tables that do not set their own budget.
    pub retries: usize,
    /// Attempts per existence query before a transient failure escalates.
    pub query_retries: usize,
    pub poll_interval_ms: u64,
    /// Base backoff between existence query attempts.
    pub retry_delay_ms: u64,
    /// Upper bound on any single dependency wait. Unset waits forever.
    pub wait_timeout_ms: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRY_BUDGET,
            query_retries: 5,
            poll_interval_ms: 50,
            retry_delay_ms: 250,
            wait_timeout_ms: None,
        }
    }
}

impl EngineSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    pub fn query_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.query_retries,
            Duration::from_millis(self.retry_delay_ms),
            Duration::from_secs(5),
        )
    }
}
