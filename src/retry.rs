//! Retry policies for browser initialization.
//!
//! A [`BrowserPool`](crate::BrowserPool) makes exactly one launch attempt per
//! [`ensure_ready`](crate::BrowserPool::ensure_ready) call. Callers that
//! want more (startup, the health monitor) pass a [`RetryPolicy`] to
//! [`ensure_ready_with_retry`](crate::BrowserPool::ensure_ready_with_retry).
//!
//! ```rust
//! use md2pdf_server::{DelayStrategy, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(5, DelayStrategy::Linear(Duration::from_secs(1)));
//! assert_eq!(policy.delay_after(1), Duration::from_secs(1));
//! assert_eq!(policy.delay_after(3), Duration::from_secs(3));
//! ```

use std::time::Duration;

/// How long to wait between two attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayStrategy {
    /// Retry immediately.
    None,
    /// Same delay after every failed attempt.
    Fixed(Duration),
    /// `attempt × unit` after the n-th failed attempt (1-based).
    Linear(Duration),
}

/// Bounded retry with a delay strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. Always at least 1.
    pub max_attempts: u32,

    /// Delay between attempts.
    pub delay: DelayStrategy,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` of 0 is raised to 1.
    pub fn new(max_attempts: u32, delay: DelayStrategy) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Startup policy: 5 attempts, linear backoff in 1 second steps.
    pub fn startup() -> Self {
        Self::new(5, DelayStrategy::Linear(Duration::from_secs(1)))
    }

    /// Self-healing policy used by the health monitor: 3 attempts, 2 seconds apart.
    pub fn recovery() -> Self {
        Self::new(3, DelayStrategy::Fixed(Duration::from_secs(2)))
    }

    /// `attempts` tries with no delay. Intended for tests.
    pub fn immediate(attempts: u32) -> Self {
        Self::new(attempts, DelayStrategy::None)
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.delay {
            DelayStrategy::None => Duration::ZERO,
            DelayStrategy::Fixed(d) => d,
            DelayStrategy::Linear(unit) => unit.saturating_mul(attempt),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::startup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_attempts_is_raised_to_one() {
        assert_eq!(RetryPolicy::new(0, DelayStrategy::None).max_attempts, 1);
    }

    #[test]
    fn test_delay_strategies() {
        assert_eq!(RetryPolicy::immediate(3).delay_after(2), Duration::ZERO);

        let fixed = RetryPolicy::new(3, DelayStrategy::Fixed(Duration::from_millis(250)));
        assert_eq!(fixed.delay_after(1), Duration::from_millis(250));
        assert_eq!(fixed.delay_after(2), Duration::from_millis(250));

        let linear = RetryPolicy::startup();
        assert_eq!(linear.max_attempts, 5);
        assert_eq!(linear.delay_after(4), Duration::from_secs(4));
    }

    #[test]
    fn test_recovery_defaults() {
        let policy = RetryPolicy::recovery();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, DelayStrategy::Fixed(Duration::from_secs(2)));
    }
}
