//! Single-instance browser pool with lifecycle management.
//!
//! This module provides [`BrowserPool`], which owns exactly one live
//! headless browser and hands it out to concurrent callers.
//!
//! # Overview
//!
//! - **Lazy, validated initialization**: a process is launched and smoke
//!   tested before anyone can see it
//! - **No initialization races**: concurrent callers of
//!   [`ensure_ready`](BrowserPool::ensure_ready) produce one launch
//! - **Bounded initialization**: launch plus smoke test are cut off after
//!   [`init_timeout`](crate::PoolConfig::init_timeout)
//! - **Explicit termination**: the process is stopped by
//!   [`reset`](BrowserPool::reset) or [`shutdown`](BrowserPool::shutdown),
//!   never by dropping a handle
//!
//! # Architecture
//!
//! ```text
//! BrowserPool
//!   ├─ state: RwLock<InstanceState>
//!   │   ├─ handle: Option<Arc<TrackedBrowser>>
//!   │   ├─ initialized: bool
//!   │   └─ last_used: Option<Instant>
//!   ├─ ready: AtomicBool                 (mirror of `initialized`)
//!   ├─ last_used_at: Mutex<Option<DateTime<Utc>>>
//!   ├─ launch_pending: Arc<AtomicBool>   (cleared by the launcher thread)
//!   ├─ factory: Arc<dyn BrowserFactory>  (runs on the launcher thread)
//!   └─ clock: Arc<dyn Clock>
//! ```
//!
//! # Locking Protocol
//!
//! 1. **Readers** (`is_ready`, `acquire`, `last_used`, `stats`) take the
//!    shared lock.
//! 2. **Writers** (`ensure_ready` when it has to launch, `touch`, `reset`)
//!    take the exclusive lock.
//! 3. **Double-checked initialization**: `ensure_ready` checks readiness
//!    under the shared lock, then re-checks under the exclusive lock before
//!    launching. Callers that queued behind a successful initializer return
//!    without launching again.
//! 4. The exclusive lock is held across launch and smoke test. Concurrent
//!    readers wait for at most `init_timeout` while that happens; in
//!    exchange no reader ever sees an unvalidated process.
//! 5. `reset` terminates the old process before releasing the lock, so a
//!    new launch can never overlap with the old process.
//! 6. A launch abandoned after `init_timeout` keeps `launch_pending` set
//!    until its thread has cleaned up. No new launch starts meanwhile.
//! 7. [`is_ready_nonblocking`](BrowserPool::is_ready_nonblocking) and
//!    [`last_used_at`](BrowserPool::last_used_at) never touch the state
//!    lock, so status endpoints answer while an initialization holds it.
//!
//! # Example
//!
//! ```rust,no_run
//! use md2pdf_server::{BrowserPool, BrowserProcess, ChromeBrowserFactory, PdfOptions};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = BrowserPool::builder()
//!     .factory(Box::new(ChromeBrowserFactory::with_defaults()))
//!     .build()?;
//!
//! pool.ensure_ready()?;
//! let browser = pool.acquire()?;
//! pool.touch();
//! let pdf = browser.print_to_pdf("data:text/html,hi", &PdfOptions::default(), Duration::from_secs(30))?;
//!
//! pool.shutdown();
//! # Ok(())
//! # }
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};
use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::factory::BrowserFactory;
use crate::handle::BrowserHandle;
use crate::retry::RetryPolicy;
use crate::stats::PoolStats;
use crate::tracked::TrackedBrowser;
use crate::traits::BrowserProcess;

// ============================================================================
// InstanceState
// ============================================================================

/// The protected record. Only touched through `BrowserPool::{read,write}_state`.
///
/// Invariant: `initialized` implies `handle.is_some()`, and the handle
/// passed its smoke test.
#[derive(Default)]
struct InstanceState {
    handle: Option<Arc<TrackedBrowser>>,

    initialized: bool,

    /// Monotonic last use, for idle tracking.
    last_used: Option<Instant>,
}

impl InstanceState {
    #[inline]
    fn is_ready(&self) -> bool {
        self.initialized && self.handle.is_some()
    }

    /// Record a use at `now`. Never moves `last_used` backwards.
    fn mark_used(&mut self, now: Instant) {
        if self.last_used.is_none_or(|prev| now > prev) {
            self.last_used = Some(now);
        }
    }
}

/// Hand-off between a caller of `launch_validated` and the launcher thread.
#[derive(Default)]
struct LaunchSlot {
    result: Option<Result<Box<dyn BrowserProcess>>>,

    /// Set by the caller when it stops waiting.
    abandoned: bool,
}

// ============================================================================
// BrowserPool
// ============================================================================

/// Owner of the single shared browser process.
///
/// Build with [`BrowserPool::builder`], share as
/// [`SharedBrowserPool`](crate::SharedBrowserPool) (`Arc<BrowserPool>`).
/// All methods take `&self`.
pub struct BrowserPool {
    config: PoolConfig,

    factory: Arc<dyn BrowserFactory>,

    clock: Arc<dyn Clock>,

    state: RwLock<InstanceState>,

    /// Written under the state write lock, read without any lock.
    ready: AtomicBool,

    /// Wall-clock last use, for reporting.
    last_used_at: Mutex<Option<DateTime<Utc>>>,

    /// Set while a launcher thread is running, abandoned or not.
    launch_pending: Arc<AtomicBool>,

    /// Once set, no new launches start.
    shutting_down: AtomicBool,

    /// Wakes retry backoffs on shutdown.
    shutdown_signal: (Mutex<()>, Condvar),

    launches: AtomicU64,

    failed_launches: AtomicU64,

    resets: AtomicU64,
}

impl BrowserPool {
    /// Create a new builder.
    pub fn builder() -> BrowserPoolBuilder {
        BrowserPoolBuilder::new()
    }

    /// Wrap in an `Arc` for sharing with handlers and the health monitor.
    pub fn into_shared(self) -> Arc<BrowserPool> {
        Arc::new(self)
    }

    /// The pool configuration.
    #[inline]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn read_state(&self) -> RwLockReadGuard<'_, InstanceState> {
        self.state.read().unwrap_or_else(|poisoned| {
            log::warn!("Instance state lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, InstanceState> {
        self.state.write().unwrap_or_else(|poisoned| {
            log::warn!("Instance state lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Record a use at `now`, under the state write lock.
    fn record_use(&self, state: &mut InstanceState, now: Instant) {
        state.mark_used(now);

        let wall = Utc::now();
        let mut last_used_at = self.last_used_at.lock().unwrap_or_else(|e| e.into_inner());
        if last_used_at.is_none_or(|prev| wall > prev) {
            *last_used_at = Some(wall);
        }
    }

    /// Make sure a validated browser is installed.
    ///
    /// Returns immediately if one already is. Otherwise makes exactly one
    /// launch attempt: launch, smoke test, install. On failure the pool is
    /// left uninitialized and a later call may try again. This method never
    /// retries; see [`ensure_ready_with_retry`](Self::ensure_ready_with_retry).
    ///
    /// Blocks for up to [`init_timeout`](PoolConfig::init_timeout) when it
    /// has to launch. Call it from a blocking context in async code.
    ///
    /// # Errors
    ///
    /// - [`PoolError::BrowserLaunch`] - the factory could not start a process,
    ///   or an earlier timed-out launch has not finished yet
    /// - [`PoolError::SmokeTestFailed`] - the process started but did not respond
    /// - [`PoolError::InitTimeout`] - launch + smoke test took too long
    /// - [`PoolError::ShuttingDown`] - [`shutdown`](Self::shutdown) was called
    pub fn ensure_ready(&self) -> Result<()> {
        // Fast path: shared lock only
        if self.is_ready() {
            log::trace!("ensure_ready: already initialized");
            return Ok(());
        }

        if self.is_shutting_down() {
            return Err(PoolError::ShuttingDown);
        }

        let mut state = self.write_state();

        // Re-check under the exclusive lock: another caller may have
        // initialized while this one waited for the lock.
        if state.is_ready() {
            log::debug!("ensure_ready: initialized by a concurrent caller");
            return Ok(());
        }

        if self.is_shutting_down() {
            return Err(PoolError::ShuttingDown);
        }

        // At most one process may exist, even one nobody waits for
        if self.launch_pending.load(Ordering::Acquire) {
            log::warn!("⚠️ Previous browser launch still pending, not starting another");
            return Err(PoolError::BrowserLaunch("previous launch still pending".to_string()));
        }

        // `initialized` is false, so a leftover handle is not trusted
        if let Some(stale) = state.handle.take() {
            log::warn!("⚠️ Discarding unvalidated browser {}", stale.id());
            terminate_logged(&stale);
        }

        log::info!(" Initializing browser instance...");
        let started = Instant::now();

        match self.launch_validated() {
            Ok(process) => {
                let now = self.clock.now();
                let tracked = Arc::new(TrackedBrowser::new(process, now));

                log::info!(
                    "✅ Browser {} ready in {:?} (pid: {:?})",
                    tracked.id(),
                    started.elapsed(),
                    tracked.process().process_id()
                );

                state.handle = Some(tracked);
                self.record_use(&mut state, now);
                state.initialized = true;
                self.ready.store(true, Ordering::Release);
                self.launches.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.failed_launches.fetch_add(1, Ordering::Relaxed);
                state.initialized = false;
                self.ready.store(false, Ordering::Release);
                log::warn!(
                    "❌ Browser initialization failed after {:?}: {}",
                    started.elapsed(),
                    e
                );
                Err(e)
            }
        }
    }

    /// [`ensure_ready`](Self::ensure_ready) under a retry policy.
    ///
    /// Waits between attempts as the policy says. A
    /// [`shutdown`](Self::shutdown) interrupts the wait.
    ///
    /// # Errors
    ///
    /// The error of the last attempt, or [`PoolError::ShuttingDown`].
    pub fn ensure_ready_with_retry(&self, policy: &RetryPolicy) -> Result<()> {
        self.retry_ensure_ready(policy, |delay| self.wait_for_shutdown(delay))
    }

    /// Retry loop behind [`ensure_ready_with_retry`](Self::ensure_ready_with_retry).
    ///
    /// `backoff` waits out a delay and returns `true` to give up early.
    pub(crate) fn retry_ensure_ready<F>(&self, policy: &RetryPolicy, mut backoff: F) -> Result<()>
    where
        F: FnMut(Duration) -> bool,
    {
        let mut last_error = PoolError::NotReady;

        for attempt in 1..=policy.max_attempts {
            match self.ensure_ready() {
                Ok(()) => {
                    if attempt > 1 {
                        log::info!("Browser ready after {} attempts", attempt);
                    }
                    return Ok(());
                }
                Err(PoolError::ShuttingDown) => return Err(PoolError::ShuttingDown),
                Err(e) => {
                    log::warn!(
                        "Browser initialization attempt {}/{} failed: {}",
                        attempt,
                        policy.max_attempts,
                        e
                    );
                    last_error = e;
                }
            }

            if attempt < policy.max_attempts {
                let delay = policy.delay_after(attempt);
                log::debug!("Retrying browser initialization in {:?}", delay);
                if backoff(delay) {
                    if self.is_shutting_down() {
                        return Err(PoolError::ShuttingDown);
                    }
                    log::debug!("Browser initialization retries interrupted");
                    return Err(last_error);
                }
            }
        }

        Err(last_error)
    }

    /// Wait up to `delay`. Returns `true` if the pool is shutting down.
    fn wait_for_shutdown(&self, delay: Duration) -> bool {
        if delay.is_zero() {
            return self.is_shutting_down();
        }

        let (lock, cvar) = &self.shutdown_signal;
        let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let _guard = cvar
            .wait_timeout_while(guard, delay, |_| !self.is_shutting_down())
            .unwrap_or_else(|e| e.into_inner());
        self.is_shutting_down()
    }

    /// Startup initialization using [`PoolConfig::startup_retry`].
    ///
    /// Runs on the blocking thread pool. Callers are expected to log a
    /// failure and keep serving: a later `ensure_ready` (first request or
    /// the health monitor) gets another chance.
    ///
    /// # Errors
    ///
    /// The last initialization error if every attempt failed.
    pub async fn warmup(self: &Arc<Self>) -> Result<()> {
        let policy = self.config.startup_retry;
        log::info!(
            "Starting browser warmup ({} attempts, {:?} backoff)",
            policy.max_attempts,
            policy.delay
        );

        let pool = Arc::clone(self);
        match tokio::task::spawn_blocking(move || pool.ensure_ready_with_retry(&policy)).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("❌ Warmup task panicked: {}", e);
                Err(PoolError::BrowserLaunch(format!("warmup task failed: {}", e)))
            }
        }
    }

    /// Launch a process and smoke test it on a dedicated thread, waiting at
    /// most `init_timeout`.
    ///
    /// If the wait times out, the launcher thread terminates whatever it
    /// eventually produces. `launch_pending` stays set until then.
    fn launch_validated(&self) -> Result<Box<dyn BrowserProcess>> {
        let timeout = self.config.init_timeout;
        let slot = Arc::new((Mutex::new(LaunchSlot::default()), Condvar::new()));

        let factory = Arc::clone(&self.factory);
        let thread_slot = Arc::clone(&slot);
        let pending = Arc::clone(&self.launch_pending);

        self.launch_pending.store(true, Ordering::Release);

        let spawned = thread::Builder::new()
            .name("browser-launcher".to_string())
            .spawn(move || {
                let result = catch_unwind(AssertUnwindSafe(|| {
                    launch_and_smoke_test(factory.as_ref(), timeout)
                }))
                .unwrap_or_else(|_| {
                    log::error!("Browser launcher panicked");
                    Err(PoolError::BrowserLaunch("launcher panicked".to_string()))
                });

                let (lock, cvar) = &*thread_slot;
                let mut slot = lock.lock().unwrap_or_else(|e| e.into_inner());

                if slot.abandoned {
                    drop(slot);
                    if let Ok(process) = result {
                        log::warn!(
                            "⚠️ Late browser launch after timeout, terminating it (pid: {:?})",
                            process.process_id()
                        );
                        if let Err(e) = process.terminate() {
                            log::warn!("Failed to terminate late browser: {}", e);
                        }
                    }
                    pending.store(false, Ordering::Release);
                    return;
                }

                // Cleared before the waiter can observe the result
                pending.store(false, Ordering::Release);
                slot.result = Some(result);
                cvar.notify_all();
            });

        if let Err(e) = spawned {
            self.launch_pending.store(false, Ordering::Release);
            return Err(PoolError::BrowserLaunch(format!("failed to spawn launcher: {}", e)));
        }

        let (lock, cvar) = &*slot;
        let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let (mut guard, _) = cvar
            .wait_timeout_while(guard, timeout, |slot| slot.result.is_none())
            .unwrap_or_else(|e| e.into_inner());

        match guard.result.take() {
            Some(result) => result,
            None => {
                guard.abandoned = true;
                log::error!("❌ Browser launch timed out after {:?}", timeout);
                Err(PoolError::InitTimeout(timeout))
            }
        }
    }

    /// Lease the live browser.
    ///
    /// Shared lock only; never launches. Call
    /// [`ensure_ready`](Self::ensure_ready) first.
    ///
    /// # Errors
    ///
    /// - [`PoolError::NotReady`] - no validated browser installed
    /// - [`PoolError::ShuttingDown`] - the pool is shutting down
    pub fn acquire(&self) -> Result<BrowserHandle> {
        if self.is_shutting_down() {
            return Err(PoolError::ShuttingDown);
        }

        let state = self.read_state();
        match &state.handle {
            Some(tracked) if state.initialized => {
                log::trace!("Acquired browser {}", tracked.id());
                Ok(BrowserHandle::new(Arc::clone(tracked)))
            }
            _ => Err(PoolError::NotReady),
        }
    }

    /// Record that the browser is in use now.
    pub fn touch(&self) {
        let now = self.clock.now();
        let mut state = self.write_state();
        self.record_use(&mut state, now);
    }

    /// Whether a validated browser is installed.
    ///
    /// Waits for an initialization in progress. See
    /// [`is_ready_nonblocking`](Self::is_ready_nonblocking) for status
    /// reporting.
    pub fn is_ready(&self) -> bool {
        self.read_state().is_ready()
    }

    /// Readiness as of the last completed state change.
    ///
    /// Never waits on the state lock: while an initialization is running
    /// this reports `false`.
    pub fn is_ready_nonblocking(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Monotonic time of last use, if the browser was ever used.
    pub fn last_used(&self) -> Option<Instant> {
        self.read_state().last_used
    }

    /// Wall-clock time of last use, if the browser was ever used.
    ///
    /// Never waits on the state lock.
    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        *self.last_used_at.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// How long the live browser has been idle. Zero when not ready.
    pub fn idle_duration(&self) -> Duration {
        let state = self.read_state();
        match (state.is_ready(), state.last_used) {
            (true, Some(last)) => self.clock.now().saturating_duration_since(last),
            _ => Duration::ZERO,
        }
    }

    /// Terminate the live browser, if any, and clear the state.
    ///
    /// Never fails. Termination errors are logged: the point is a clean
    /// slate for the next [`ensure_ready`](Self::ensure_ready).
    pub fn reset(&self) {
        let mut state = self.write_state();
        state.initialized = false;
        self.ready.store(false, Ordering::Release);

        match state.handle.take() {
            Some(tracked) => {
                log::info!(
                    " Resetting browser {} (age: {}s)",
                    tracked.id(),
                    tracked.age(self.clock.now()).as_secs()
                );
                terminate_logged(&tracked);
                self.resets.fetch_add(1, Ordering::Relaxed);
            }
            None => log::debug!("Reset requested with no live browser"),
        }
    }

    /// Snapshot of the pool state.
    pub fn stats(&self) -> PoolStats {
        let (ready, instance_id) = {
            let state = self.read_state();
            (state.is_ready(), state.handle.as_ref().map(|t| t.id()))
        };

        PoolStats {
            ready,
            instance_id,
            launches: self.launches.load(Ordering::Relaxed),
            failed_launches: self.failed_launches.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            idle: self.idle_duration(),
        }
    }

    /// Check if the pool is shutting down.
    #[inline]
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Stop accepting launches and terminate the live browser.
    ///
    /// Idempotent. Stop the [`HealthMonitor`](crate::HealthMonitor) first
    /// so it does not observe the empty state.
    pub fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            log::debug!("Pool already shut down");
            return;
        }

        log::info!(" Shutting down browser pool...");
        {
            let (lock, cvar) = &self.shutdown_signal;
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            cvar.notify_all();
        }
        self.reset();

        log::info!("✅ Browser pool shut down: {}", self.stats());
    }
}

impl Drop for BrowserPool {
    fn drop(&mut self) {
        if !self.is_shutting_down() {
            log::debug!("BrowserPool dropped without explicit shutdown - cleaning up");
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for BrowserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserPool")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .field("shutting_down", &self.is_shutting_down())
            .finish_non_exhaustive()
    }
}

/// Body of the launcher thread.
fn launch_and_smoke_test(
    factory: &dyn BrowserFactory,
    timeout: Duration,
) -> Result<Box<dyn BrowserProcess>> {
    let process = factory.create()?;

    log::debug!("Smoke testing new browser (pid: {:?})...", process.process_id());
    if let Err(e) = process.ping(timeout) {
        log::warn!("❌ Browser smoke test failed: {}", e);
        if let Err(term_err) = process.terminate() {
            log::warn!("Failed to terminate browser after smoke test: {}", term_err);
        }
        return Err(PoolError::SmokeTestFailed(e.to_string()));
    }

    Ok(process)
}

fn terminate_logged(tracked: &TrackedBrowser) {
    match tracked.terminate() {
        Ok(true) => log::info!("✅ Browser {} terminated", tracked.id()),
        Ok(false) => {}
        Err(e) => log::warn!("Failed to terminate browser {}: {}", tracked.id(), e),
    }
}

// ============================================================================
// BrowserPoolBuilder
// ============================================================================

/// Builder for [`BrowserPool`].
///
/// The factory is required; config and clock default.
pub struct BrowserPoolBuilder {
    config: Option<PoolConfig>,

    factory: Option<Box<dyn BrowserFactory>>,

    clock: Option<Arc<dyn Clock>>,
}

impl BrowserPoolBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            factory: None,
            clock: None,
        }
    }

    /// Set the pool configuration.
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the browser factory (required).
    pub fn factory(mut self, factory: Box<dyn BrowserFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Set the time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the pool. Nothing is launched yet.
    ///
    /// # Errors
    ///
    /// [`PoolError::Configuration`] if no factory was provided.
    pub fn build(self) -> Result<BrowserPool> {
        let config = self.config.unwrap_or_default();
        let factory = self
            .factory
            .ok_or_else(|| PoolError::Configuration("No browser factory provided".to_string()))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        log::info!("Building browser pool with config: {:?}", config);

        Ok(BrowserPool {
            config,
            factory: Arc::from(factory),
            clock,
            state: RwLock::new(InstanceState::default()),
            ready: AtomicBool::new(false),
            last_used_at: Mutex::new(None),
            launch_pending: Arc::new(AtomicBool::new(false)),
            shutting_down: AtomicBool::new(false),
            shutdown_signal: (Mutex::new(()), Condvar::new()),
            launches: AtomicU64::new(0),
            failed_launches: AtomicU64::new(0),
            resets: AtomicU64::new(0),
        })
    }
}

impl Default for BrowserPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Initialization (feature-gated)
// ============================================================================

/// Build a Chrome-backed pool from the environment and warm it up.
///
/// `chrome_path` overrides `CHROME_PATH`. A failed warmup is logged and the
/// pool is returned anyway, uninitialized: the service stays reachable and
/// the first request or the health monitor retries.
///
/// # Errors
///
/// Only configuration errors.
#[cfg(feature = "env-config")]
pub async fn init_browser_pool(chrome_path: Option<String>) -> Result<Arc<BrowserPool>> {
    use crate::config::env::{chrome_path_from_env, from_env};
    use crate::factory::ChromeBrowserFactory;

    log::info!("Initializing browser pool from environment...");

    let config = from_env()?;

    let factory: Box<dyn BrowserFactory> = match chrome_path.or_else(chrome_path_from_env) {
        Some(path) => {
            log::info!("Using custom Chrome path: {}", path);
            Box::new(ChromeBrowserFactory::with_path(path))
        }
        None => {
            log::info!("Using auto-detected Chrome browser");
            Box::new(ChromeBrowserFactory::with_defaults())
        }
    };

    let pool = BrowserPool::builder()
        .config(config)
        .factory(factory)
        .build()?
        .into_shared();

    match pool.warmup().await {
        Ok(()) => log::info!("✅ Browser pool ready: {}", pool.stats()),
        Err(e) => log::warn!(
            "⚠️ Browser unavailable at startup ({}); starting anyway, will retry on demand",
            e
        ),
    }

    Ok(pool)
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
    use crate::retry::DelayStrategy;
    use crate::traits::Healthcheck;

    fn pool_with(factory: &MockBrowserFactory) -> BrowserPool {
        BrowserPool::builder()
            .factory(Box::new(factory.clone()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_pool_builder_missing_factory() {
        match BrowserPool::builder().build() {
            Err(PoolError::Configuration(msg)) => {
                assert!(msg.contains("No browser factory provided"), "got: {}", msg);
            }
            _ => panic!("Expected Configuration error for missing factory"),
        }
    }

    #[test]
    fn test_new_pool_is_not_ready() {
        let factory = MockBrowserFactory::new();
        let pool = pool_with(&factory);

        assert!(!pool.is_ready());
        assert!(matches!(pool.acquire(), Err(PoolError::NotReady)));
        assert_eq!(pool.last_used(), None);
        assert_eq!(factory.launch_count(), 0);
    }

    #[test]
    fn test_ensure_ready_runs_smoke_test() {
        let factory = MockBrowserFactory::new();
        let pool = pool_with(&factory);

        pool.ensure_ready().unwrap();

        assert!(pool.is_ready());
        assert_eq!(factory.ping_count(), 1);
        assert!(pool.last_used().is_some());
        assert!(pool.last_used_at().is_some());
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let factory = MockBrowserFactory::new();
        let clock = Arc::new(ManualClock::new());
        let pool = BrowserPool::builder()
            .factory(Box::new(factory))
            .clock(clock.clone())
            .build()
            .unwrap();

        pool.ensure_ready().unwrap();
        let first = pool.last_used().unwrap();

        clock.advance(Duration::from_secs(10));
        pool.touch();
        let second = pool.last_used().unwrap();
        assert_eq!(second - first, Duration::from_secs(10));

        // Same reading again: unchanged
        pool.touch();
        assert_eq!(pool.last_used().unwrap(), second);
    }

    #[test]
    fn test_idle_duration_follows_clock() {
        let clock = Arc::new(ManualClock::new());
        let pool = BrowserPool::builder()
            .factory(Box::new(MockBrowserFactory::new()))
            .clock(clock.clone())
            .build()
            .unwrap();

        assert_eq!(pool.idle_duration(), Duration::ZERO);
        pool.ensure_ready().unwrap();
        clock.advance(Duration::from_secs(120));
        assert_eq!(pool.idle_duration(), Duration::from_secs(120));

        pool.touch();
        assert_eq!(pool.idle_duration(), Duration::ZERO);
    }

    #[test]
    fn test_launch_timeout_terminates_late_process() {
        let factory = MockBrowserFactory::new().with_launch_delay(Duration::from_millis(300));
        let config = PoolConfigBuilder::new()
            .init_timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let pool = BrowserPool::builder()
            .config(config)
            .factory(Box::new(factory.clone()))
            .build()
            .unwrap();

        let result = pool.ensure_ready();
        assert!(matches!(result, Err(PoolError::InitTimeout(_))));
        assert!(!pool.is_ready());

        // The launcher finishes later and cleans up after itself
        thread::sleep(Duration::from_millis(600));
        assert_eq!(factory.terminate_count(), 1);
        assert!(!pool.is_ready());
    }

    #[test]
    fn test_pending_launch_blocks_second_process() {
        let factory = MockBrowserFactory::new().with_launch_delay(Duration::from_millis(400));
        let config = PoolConfigBuilder::new()
            .init_timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let pool = BrowserPool::builder()
            .config(config)
            .factory(Box::new(factory.clone()))
            .build()
            .unwrap();

        let result = pool.ensure_ready_with_retry(&RetryPolicy::immediate(3));

        match result {
            Err(PoolError::BrowserLaunch(msg)) => assert!(msg.contains("pending"), "got: {}", msg),
            other => panic!("Expected BrowserLaunch, got {:?}", other),
        }
        assert_eq!(factory.launch_count(), 1);
        assert_eq!(factory.max_live_count(), 1);

        // Once the late process is gone, launching is allowed again
        thread::sleep(Duration::from_millis(600));
        assert_eq!(factory.live_count(), 0);
        assert!(!pool.launch_pending.load(Ordering::SeqCst));
        assert!(matches!(pool.ensure_ready(), Err(PoolError::InitTimeout(_))));
        assert_eq!(factory.launch_count(), 2);
    }

    #[test]
    fn test_status_readable_during_initialization() {
        let factory = MockBrowserFactory::new().with_launch_delay(Duration::from_millis(800));
        let pool = Arc::new(pool_with(&factory));

        let initializer = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.ensure_ready())
        };
        thread::sleep(Duration::from_millis(100));

        let started = Instant::now();
        assert!(!pool.is_ready_nonblocking());
        assert_eq!(pool.last_used_at(), None);
        assert!(started.elapsed() < Duration::from_millis(200));

        initializer.join().unwrap().unwrap();
        assert!(pool.is_ready_nonblocking());
        assert!(pool.last_used_at().is_some());

        pool.reset();
        assert!(!pool.is_ready_nonblocking());
    }

    #[test]
    fn test_shutdown_interrupts_retry_backoff() {
        let factory = MockBrowserFactory::always_fails("down");
        let pool = Arc::new(pool_with(&factory));
        let policy = RetryPolicy::new(3, DelayStrategy::Fixed(Duration::from_secs(10)));

        let retrying = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.ensure_ready_with_retry(&policy))
        };
        thread::sleep(Duration::from_millis(100));

        let started = Instant::now();
        pool.shutdown();
        let result = retrying.join().unwrap();

        assert!(matches!(result, Err(PoolError::ShuttingDown)));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(factory.launch_count(), 1);
    }

    #[test]
    fn test_reset_without_instance_is_noop() {
        let factory = MockBrowserFactory::new();
        let pool = pool_with(&factory);

        pool.reset();
        pool.reset();

        assert_eq!(pool.stats().resets, 0);
        assert_eq!(factory.terminate_count(), 0);
    }

    #[test]
    fn test_handle_outlives_reset() {
        let factory = MockBrowserFactory::new();
        let pool = pool_with(&factory);

        pool.ensure_ready().unwrap();
        let handle = pool.acquire().unwrap();
        pool.reset();

        assert!(handle.is_terminated());
        assert!(handle.ping(Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_shutdown_rejects_new_work() {
        let factory = MockBrowserFactory::new();
        let pool = pool_with(&factory);

        pool.ensure_ready().unwrap();
        pool.shutdown();

        assert!(!pool.is_ready());
        assert_eq!(factory.terminate_count(), 1);
        assert!(matches!(pool.ensure_ready(), Err(PoolError::ShuttingDown)));
        assert!(matches!(pool.acquire(), Err(PoolError::ShuttingDown)));

        // Second shutdown does nothing
        pool.shutdown();
        assert_eq!(factory.terminate_count(), 1);
    }

    #[test]
    fn test_drop_terminates_browser() {
        let factory = MockBrowserFactory::new();
        {
            let pool = pool_with(&factory);
            pool.ensure_ready().unwrap();
        }
        assert_eq!(factory.terminate_count(), 1);
    }

    #[test]
    fn test_retry_stops_on_shutdown() {
        let factory = MockBrowserFactory::always_fails("nope");
        let pool = pool_with(&factory);
        pool.shutdown();

        let result = pool.ensure_ready_with_retry(&RetryPolicy::immediate(5));
        assert!(matches!(result, Err(PoolError::ShuttingDown)));
        assert_eq!(factory.launch_count(), 0);
    }

    #[test]
    fn test_builder_default() {
        let builder: BrowserPoolBuilder = Default::default();
        assert!(builder.config.is_none());
        assert!(builder.factory.is_none());
        assert!(builder.clock.is_none());
    }
}
