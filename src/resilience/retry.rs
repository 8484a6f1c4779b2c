//! Retry policy with exponential backoff.

use std::time::Duration;

/// What to do after a failed network attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Retries transport failures up to `max_retries` times, waiting
/// `base_delay * 2^attempt` before each one.
///
/// Attempt numbers are 0-based: the first failure is attempt 0. No jitter is
/// applied, so tasks that fail together retry together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Never retry.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.checked_mul(factor).unwrap_or(Duration::MAX)
    }

    pub fn decide(&self, attempt: u32) -> Decision {
        if self.should_retry(attempt) {
            Decision::Retry {
                delay: self.delay_for(attempt),
            }
        } else {
            Decision::Fail
        }
    }

    /// Upper bound on network attempts for one request.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_MAX_RETRIES,
            crate::config::DEFAULT_RETRY_DELAY,
        )
    }
}
