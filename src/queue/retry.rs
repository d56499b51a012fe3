//! Transient-status retry policy for queue submissions and polls

use std::time::Duration;

/// Linear-backoff retry policy.
///
/// A backend answering 404 or 503 is treated as cold or not yet ready; the
/// call is repeated up to `max_attempts` times in total, sleeping
/// `attempt × base_delay` between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(600),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Whether another attempt is allowed after the given (1-based) attempt
    pub fn should_retry(&self, status: u16, attempt: u32) -> bool {
        is_transient_status(status) && attempt < self.max_attempts
    }
}

/// Statuses that mean "backend cold or not ready"
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 404 | 503)
}
