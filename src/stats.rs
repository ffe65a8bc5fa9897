//! Pool statistics for monitoring and health checks.
//!
//! [`PoolStats`] is a point-in-time snapshot of the browser pool, taken
//! under the shared lock.
//!
//! # Example
//!
//! ```rust,ignore
//! let stats = pool.stats();
//! println!("ready: {}, launches: {}, resets: {}", stats.ready, stats.launches, stats.resets);
//! ```

use std::time::Duration;

/// Snapshot of the pool's lifecycle counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Whether a validated browser is currently installed.
    pub ready: bool,

    /// Id of the live browser, if any.
    pub instance_id: Option<u64>,

    /// Successful launches since the pool was built.
    pub launches: u64,

    /// Launch attempts that failed (launch error, smoke test, or timeout).
    pub failed_launches: u64,

    /// Resets that terminated a live browser.
    pub resets: u64,

    /// Time since the browser was last used. Zero when not ready.
    pub idle: Duration,
}

impl PoolStats {
    /// Total launch attempts, successful or not.
    #[inline]
    pub fn launch_attempts(&self) -> u64 {
        self.launches + self.failed_launches
    }
}

impl std::fmt::Display for PoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PoolStats {{ ready: {}, launches: {}/{}, failed: {}, resets: {}, idle: {}s }}",
            self.ready,
            self.launches,
            self.launch_attempts(),
            self.failed_launches,
            self.resets,
            self.idle.as_secs()
        )
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
