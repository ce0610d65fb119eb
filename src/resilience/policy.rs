use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed-delay reconnection budget.
///
/// Attempt 1 runs immediately; every later attempt waits `retry_delay_ms`.
/// After `max_attempts` consecutive failures the transport is considered
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    pub max_attempts: usize,
    pub retry_delay_ms: u64,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: usize, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay_ms: retry_delay.as_millis() as u64,
        }
    }

    /// Give up on the first failure
    pub fn never() -> Self {
        Self {
            max_attempts: 1,
            retry_delay_ms: 0,
        }
    }

    /// Delay to wait before the given 1-based attempt, or None when exhausted
    pub fn delay_before(&self, attempt: usize) -> Option<Duration> {
        match attempt {
            0 => None,
            n if n > self.max_attempts => None,
            1 => Some(Duration::ZERO),
            _ => Some(Duration::from_millis(self.retry_delay_ms)),
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_immediate() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_before(1), Some(Duration::ZERO));
        assert_eq!(policy.delay_before(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_before(3), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_before(4), None);
    }

    #[test]
    fn test_never_allows_single_attempt() {
        let policy = ReconnectPolicy::never();
        assert_eq!(policy.delay_before(1), Some(Duration::ZERO));
        assert_eq!(policy.delay_before(2), None);
    }
}
