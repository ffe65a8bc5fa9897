//! Background health monitor for the shared browser.
//!
//! [`HealthMonitor`] wakes every
//! [`health_check_interval`](crate::PoolConfig::health_check_interval) and
//! runs one cycle:
//!
//! ```text
//! not ready?              → ensure_ready_with_retry(recovery_retry)
//! idle > idle_ttl?        → reset, then ensure_ready_with_retry
//! otherwise               → ping the live browser (no pool lock held)
//!   max_ping_failures
//!   consecutive failures  → reset, then ensure_ready_with_retry
//! ```
//!
//! The thread waits on a `(Mutex<bool>, Condvar)` pair instead of sleeping,
//! so [`stop`](HealthMonitor::stop) wakes it immediately. Recovery backoffs
//! wait on the same pair and are cut short by a stop as well.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut monitor = HealthMonitor::start(Arc::clone(&pool));
//! // ... serve requests ...
//! monitor.stop_async().await;
//! pool.shutdown();
//! ```

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::pool::BrowserPool;

/// How long [`HealthMonitor::stop_async`] waits for the thread to exit.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one monitor cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAction {
    /// The live browser answered its ping.
    Healthy,

    /// Nothing was checked (shutdown, or the browser went away mid-cycle).
    Skipped,

    /// The browser was missing and a new one is now ready.
    Recovered,

    /// The browser was missing and could not be started.
    RecoveryFailed,

    /// The browser was stale or unresponsive and has been replaced.
    Recycled,

    /// The browser was stale or unresponsive; it was terminated but no
    /// replacement could be started.
    RecycleFailed,

    /// The ping failed, below the recycle threshold.
    PingFailed {
        /// Consecutive failures for the current browser.
        failures: u32,
    },
}

/// Consecutive ping failures, tied to one browser id.
#[derive(Debug, Default)]
struct FailureCount {
    instance_id: Option<u64>,
    failures: u32,
}

/// Cycle logic shared by the thread and [`HealthMonitor::run_cycle`].
struct MonitorCore {
    pool: Arc<BrowserPool>,
    failures: Mutex<FailureCount>,

    /// Stop flag + condvar for waking the thread early.
    stop_signal: (Mutex<bool>, Condvar),
}

impl MonitorCore {
    /// Wait up to `timeout`. Returns `true` once the monitor is stopped or
    /// the pool is shutting down.
    fn wait_for_stop(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &self.stop_signal;
        let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(|e| e.into_inner());
        *guard || self.pool.is_shutting_down()
    }

    fn signal_stop(&self) {
        let (lock, cvar) = &self.stop_signal;
        let mut stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
        *stopped = true;
        cvar.notify_all();
    }

    fn recover(&self) -> crate::error::Result<()> {
        let policy = self.pool.config().recovery_retry;
        self.pool.retry_ensure_ready(&policy, |delay| self.wait_for_stop(delay))
    }

    fn run_cycle(&self) -> MonitorAction {
        let pool = &self.pool;
        if pool.is_shutting_down() {
            return MonitorAction::Skipped;
        }

        let config = pool.config();

        if !pool.is_ready() {
            log::warn!("⚠️ Browser not initialized, attempting recovery...");
            self.clear_failures();
            return match self.recover() {
                Ok(()) => {
                    log::info!("✅ Browser recovered");
                    MonitorAction::Recovered
                }
                Err(e) => {
                    log::error!("❌ Browser recovery failed: {}", e);
                    MonitorAction::RecoveryFailed
                }
            };
        }

        let idle = pool.idle_duration();
        if idle > config.idle_ttl {
            log::info!(
                " Browser idle for {}s (limit: {}s), recycling",
                idle.as_secs(),
                config.idle_ttl.as_secs()
            );
            return self.recycle();
        }

        // Ping through a lease so the pool lock is not held during I/O
        let handle = match pool.acquire() {
            Ok(handle) => handle,
            Err(e) => {
                log::debug!("Browser went away before ping: {}", e);
                return MonitorAction::Skipped;
            }
        };
        let id = handle.id();
        let result = handle.ping(config.init_timeout);
        drop(handle);

        match result {
            Ok(()) => {
                self.clear_failures();
                log::trace!("Browser {} healthy", id);
                MonitorAction::Healthy
            }
            Err(_) if pool.is_shutting_down() => MonitorAction::Skipped,
            Err(e) => {
                let failures = self.record_failure(id);
                log::warn!(
                    "⚠️ Browser {} ping failed (attempt {}/{}): {}",
                    id,
                    failures,
                    config.max_ping_failures,
                    e
                );

                if failures >= config.max_ping_failures {
                    log::error!(
                        "❌ Browser {} exceeded max ping failures ({}), recycling",
                        id,
                        config.max_ping_failures
                    );
                    self.recycle()
                } else {
                    MonitorAction::PingFailed { failures }
                }
            }
        }
    }

    fn recycle(&self) -> MonitorAction {
        self.clear_failures();
        self.pool.reset();

        match self.recover() {
            Ok(()) => {
                log::info!("✅ Browser recycled");
                MonitorAction::Recycled
            }
            Err(e) => {
                log::error!("❌ Browser recycle failed, no replacement: {}", e);
                MonitorAction::RecycleFailed
            }
        }
    }

    fn record_failure(&self, instance_id: u64) -> u32 {
        let mut count = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        if count.instance_id != Some(instance_id) {
            *count = FailureCount {
                instance_id: Some(instance_id),
                failures: 0,
            };
        }
        count.failures += 1;
        count.failures
    }

    fn clear_failures(&self) {
        *self.failures.lock().unwrap_or_else(|e| e.into_inner()) = FailureCount::default();
    }
}

/// Periodic health monitor for a [`BrowserPool`].
///
/// Created idle with [`new`](Self::new) (drive it with
/// [`run_cycle`](Self::run_cycle)) or running with [`start`](Self::start).
/// Dropping a running monitor stops it.
pub struct HealthMonitor {
    core: Arc<MonitorCore>,

    thread: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    /// Monitor without a background thread.
    pub fn new(pool: Arc<BrowserPool>) -> Self {
        Self {
            core: Arc::new(MonitorCore {
                pool,
                failures: Mutex::new(FailureCount::default()),
                stop_signal: (Mutex::new(false), Condvar::new()),
            }),
            thread: None,
        }
    }

    /// Monitor with its background thread running.
    pub fn start(pool: Arc<BrowserPool>) -> Self {
        let mut monitor = Self::new(pool);
        monitor.spawn();
        monitor
    }

    fn spawn(&mut self) {
        let core = Arc::clone(&self.core);
        let config = self.core.pool.config();
        let interval = config.health_check_interval;

        log::info!(
            " Starting health monitor (interval: {}s, idle TTL: {}min, max ping failures: {})",
            interval.as_secs(),
            config.idle_ttl.as_secs() / 60,
            config.max_ping_failures
        );

        let spawned = thread::Builder::new()
            .name("health-monitor".to_string())
            .spawn(move || {
                log::debug!("Health monitor thread started");

                // The flag is checked before every wait, so a stop issued
                // before the thread first waits is not lost
                while !core.wait_for_stop(interval) {
                    let action = core.run_cycle();
                    log::debug!("Health monitor cycle: {:?}", action);
                }

                log::debug!("Health monitor thread exiting");
            });

        match spawned {
            Ok(handle) => self.thread = Some(handle),
            Err(e) => log::error!("❌ Failed to start health monitor thread: {}", e),
        }
    }

    /// Run one cycle on the calling thread. Blocks while recovering.
    pub fn run_cycle(&self) -> MonitorAction {
        self.core.run_cycle()
    }

    /// Whether the background thread is running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the background thread and wait for it. Idempotent.
    ///
    /// Blocks until an in-progress cycle finishes. Prefer
    /// [`stop_async`](Self::stop_async) in async code.
    pub fn stop(&mut self) {
        self.core.signal_stop();

        if let Some(handle) = self.thread.take() {
            log::debug!("Joining health monitor thread...");
            match handle.join() {
                Ok(()) => log::info!("✅ Health monitor stopped"),
                Err(_) => log::error!("❌ Health monitor thread panicked"),
            }
        }
    }

    /// Async version of [`stop`](Self::stop); gives the thread 5 seconds.
    pub async fn stop_async(&mut self) {
        self.core.signal_stop();

        let Some(handle) = self.thread.take() else {
            log::debug!("No health monitor thread to stop");
            return;
        };

        let join_task = tokio::task::spawn_blocking(move || handle.join());
        match tokio::time::timeout(STOP_TIMEOUT, join_task).await {
            Ok(Ok(Ok(()))) => log::info!("✅ Health monitor stopped"),
            Ok(Ok(Err(_))) => log::error!("❌ Health monitor thread panicked"),
            Ok(Err(_)) => log::error!("❌ Health monitor join task panicked"),
            Err(_) => log::error!(
                "❌ Health monitor didn't exit within {}s",
                STOP_TIMEOUT.as_secs()
            ),
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop();
        }
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::PoolConfigBuilder;
    use crate::factory::mock::MockBrowserFactory;
    use crate::retry::{DelayStrategy, RetryPolicy};

    fn pool_with(factory: &MockBrowserFactory, clock: Arc<ManualClock>) -> Arc<BrowserPool> {
        let config = PoolConfigBuilder::new()
            .idle_ttl(Duration::from_secs(60))
            .max_ping_failures(2)
            .recovery_retry(RetryPolicy::immediate(1))
            .build()
            .unwrap();

        BrowserPool::builder()
            .config(config)
            .factory(Box::new(factory.clone()))
            .clock(clock)
            .build()
            .unwrap()
            .into_shared()
    }

    #[test]
    fn test_cycle_recovers_missing_browser() {
        let factory = MockBrowserFactory::new();
        let pool = pool_with(&factory, Arc::new(ManualClock::new()));
        let monitor = HealthMonitor::new(Arc::clone(&pool));

        assert_eq!(monitor.run_cycle(), MonitorAction::Recovered);
        assert!(pool.is_ready());
        assert_eq!(monitor.run_cycle(), MonitorAction::Healthy);
        assert_eq!(factory.launch_count(), 1);
    }

    #[test]
    fn test_cycle_recovery_failure() {
        let factory = MockBrowserFactory::always_fails("down");
        let pool = pool_with(&factory, Arc::new(ManualClock::new()));
        let monitor = HealthMonitor::new(pool);

        assert_eq!(monitor.run_cycle(), MonitorAction::RecoveryFailed);
    }

    #[test]
    fn test_cycle_recycles_after_consecutive_ping_failures() {
        let factory = MockBrowserFactory::new();
        let pool = pool_with(&factory, Arc::new(ManualClock::new()));
        let monitor = HealthMonitor::new(Arc::clone(&pool));
        pool.ensure_ready().unwrap();

        factory.set_ping_failing(true);
        assert_eq!(monitor.run_cycle(), MonitorAction::PingFailed { failures: 1 });

        // A success clears the streak
        factory.set_ping_failing(false);
        assert_eq!(monitor.run_cycle(), MonitorAction::Healthy);

        factory.set_ping_failing(true);
        assert_eq!(monitor.run_cycle(), MonitorAction::PingFailed { failures: 1 });
        // Replacement fails its smoke test while pings still fail
        assert_eq!(monitor.run_cycle(), MonitorAction::RecycleFailed);
        assert_eq!(pool.stats().resets, 1);
        assert!(!pool.is_ready());
    }

    #[test]
    fn test_cycle_recycles_idle_browser() {
        let factory = MockBrowserFactory::new();
        let clock = Arc::new(ManualClock::new());
        let pool = pool_with(&factory, clock.clone());
        let monitor = HealthMonitor::new(Arc::clone(&pool));
        pool.ensure_ready().unwrap();

        clock.advance(Duration::from_secs(30));
        assert_eq!(monitor.run_cycle(), MonitorAction::Healthy);

        clock.advance(Duration::from_secs(31));
        assert_eq!(monitor.run_cycle(), MonitorAction::Recycled);
        assert_eq!(pool.stats().resets, 1);
        assert_eq!(factory.launch_count(), 2);
        assert_eq!(factory.terminate_count(), 1);
    }

    #[test]
    fn test_cycle_skips_after_shutdown() {
        let factory = MockBrowserFactory::new();
        let pool = pool_with(&factory, Arc::new(ManualClock::new()));
        let monitor = HealthMonitor::new(Arc::clone(&pool));

        pool.shutdown();
        assert_eq!(monitor.run_cycle(), MonitorAction::Skipped);
        assert_eq!(factory.launch_count(), 0);
    }

    #[test]
    fn test_stop_is_prompt_and_idempotent() {
        let factory = MockBrowserFactory::new();
        let pool = pool_with(&factory, Arc::new(ManualClock::new()));

        let mut monitor = HealthMonitor::start(pool);
        assert!(monitor.is_running());

        let started = std::time::Instant::now();
        monitor.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!monitor.is_running());

        monitor.stop();
    }

    #[test]
    fn test_stop_right_after_start_is_not_lost() {
        for _ in 0..20 {
            let pool = pool_with(&MockBrowserFactory::new(), Arc::new(ManualClock::new()));

            let started = std::time::Instant::now();
            let mut monitor = HealthMonitor::start(pool);
            monitor.stop();

            assert!(started.elapsed() < Duration::from_secs(1));
            assert!(!monitor.is_running());
        }
    }

    #[test]
    fn test_stop_interrupts_recovery_backoff() {
        let factory = MockBrowserFactory::always_fails("down");
        let config = PoolConfigBuilder::new()
            .health_check_interval(Duration::from_millis(10))
            .recovery_retry(RetryPolicy::new(3, DelayStrategy::Fixed(Duration::from_secs(10))))
            .build()
            .unwrap();
        let pool = BrowserPool::builder()
            .config(config)
            .factory(Box::new(factory.clone()))
            .build()
            .unwrap()
            .into_shared();

        let mut monitor = HealthMonitor::start(pool);
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while factory.launch_count() == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(factory.launch_count(), 1);

        let started = std::time::Instant::now();
        monitor.stop();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(factory.launch_count(), 1);
    }
}
