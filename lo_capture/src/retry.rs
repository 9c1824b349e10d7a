//! ABOUTME: Exponential backoff between unavailable frames
//! ABOUTME: Wraps the backoff crate and tracks consecutive failures

use crate::CaptureConfig;
use backoff::{backoff::Backoff, ExponentialBackoff};
use std::time::Duration;
use tracing::debug;

/// Backoff state for frame acquisition
#[derive(Debug)]
pub struct RetryPolicy {
    backoff: ExponentialBackoff,
    max_delay: Duration,
    consecutive_failures: u32,
    failure_limit: Option<u32>,
}

impl RetryPolicy {
    pub fn new(initial: Duration, max: Duration, failure_limit: Option<u32>) -> Self {
        let mut backoff = ExponentialBackoff {
            initial_interval: initial,
            current_interval: initial,
            max_interval: max,
            randomization_factor: 0.0,
            max_elapsed_time: None,
            ..Default::default()
        };
        backoff.reset();

        Self {
            backoff,
            max_delay: max,
            consecutive_failures: 0,
            failure_limit,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        let limit = match config.max_consecutive_failures {
            0 => None,
            n => Some(n),
        };
        Self::new(
            Duration::from_millis(config.retry_initial_ms),
            Duration::from_millis(config.retry_max_ms),
            limit,
        )
    }

    /// Register an unavailable frame and return how long to wait
    pub fn record_failure(&mut self) -> Duration {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let delay = self.backoff.next_backoff().unwrap_or(self.max_delay);
        debug!(
            consecutive_failures = self.consecutive_failures,
            delay_ms = delay.as_millis() as u64,
            "Backing off after unavailable frame"
        );
        delay
    }

    /// A frame arrived; start the next failure streak from the initial delay
    pub fn record_success(&mut self) {
        if self.consecutive_failures > 0 {
            self.backoff.reset();
            self.consecutive_failures = 0;
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether the failure streak has passed the configured limit
    pub fn exhausted(&self) -> bool {
        self.failure_limit
            .map_or(false, |limit| self.consecutive_failures >= limit)
    }
}
