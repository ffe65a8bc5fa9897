//! Mock browser factory for testing.
//!
//! [`MockBrowserFactory`] launches in-memory fake processes, so the pool,
//! the health monitor and the HTTP layer can be tested without Chrome.
//! Every behavior the pool reacts to is configurable: launch failures,
//! smoke-test failures, slow launches, hanging conversions, and liveness
//! pings that start failing later.
//!
//! The factory is `Clone` and clones share their counters and switches.
//! Hand one clone to the pool and keep another for assertions.
//!
//! # Feature Flag
//!
//! Available with the `test-utils` feature or under `#[cfg(test)]`.
//!
//! # Example
//!
//! ```rust,ignore
//! use md2pdf_server::factory::mock::MockBrowserFactory;
//!
//! let factory = MockBrowserFactory::new().with_pdf_bytes(b"%PDF-1.4 stub".to_vec());
//! let pool = BrowserPool::builder()
//!     .factory(Box::new(factory.clone()))
//!     .build()?;
//!
//! pool.ensure_ready()?;
//! assert_eq!(factory.launch_count(), 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::BrowserFactory;
use crate::error::{ConversionError, PoolError, Result};
use crate::service::PdfOptions;
use crate::traits::{BrowserProcess, Healthcheck};

/// Bytes returned by mock conversions unless overridden.
pub const DEFAULT_MOCK_PDF: &[u8] = b"%PDF-1.4 mock";

#[derive(Debug, Default)]
struct MockShared {
    launches: AtomicUsize,
    terminations: AtomicUsize,
    pings: AtomicUsize,
    conversions: AtomicUsize,
    /// Processes between the start of `create` and `terminate`.
    live: AtomicUsize,
    max_live: AtomicUsize,
    ping_failing: AtomicBool,
    launch_failing: AtomicBool,
}

/// Configurable fake [`BrowserFactory`].
#[derive(Clone)]
pub struct MockBrowserFactory {
    error_message: String,
    fail_after: Option<usize>,
    fail_first: usize,
    launch_delay: Duration,
    conversion_delay: Duration,
    conversion_error: Option<ConversionError>,
    pdf_bytes: Arc<Vec<u8>>,
    shared: Arc<MockShared>,
}

impl MockBrowserFactory {
    /// Factory whose launches, pings and conversions all succeed.
    pub fn new() -> Self {
        Self {
            error_message: "mock launch failure".to_string(),
            fail_after: None,
            fail_first: 0,
            launch_delay: Duration::ZERO,
            conversion_delay: Duration::ZERO,
            conversion_error: None,
            pdf_bytes: Arc::new(DEFAULT_MOCK_PDF.to_vec()),
            shared: Arc::new(MockShared::default()),
        }
    }

    /// Every launch fails with [`PoolError::BrowserLaunch`].
    pub fn always_fails<S: Into<String>>(message: S) -> Self {
        let factory = Self {
            error_message: message.into(),
            ..Self::new()
        };
        factory.set_launch_failing(true);
        factory
    }

    /// The first `n` launches succeed, later ones fail.
    pub fn fail_after_n<S: Into<String>>(n: usize, message: S) -> Self {
        Self {
            error_message: message.into(),
            fail_after: Some(n),
            ..Self::new()
        }
    }

    /// The first `n` launches fail, later ones succeed.
    pub fn fail_first_n<S: Into<String>>(n: usize, message: S) -> Self {
        Self {
            error_message: message.into(),
            fail_first: n,
            ..Self::new()
        }
    }

    /// Launches succeed but every ping, including the smoke test, fails
    /// until [`set_ping_failing(false)`](Self::set_ping_failing).
    pub fn fails_smoke_test() -> Self {
        let factory = Self::new();
        factory.set_ping_failing(true);
        factory
    }

    /// Sleep this long inside every launch.
    pub fn with_launch_delay(mut self, delay: Duration) -> Self {
        self.launch_delay = delay;
        self
    }

    /// Sleep this long inside every conversion (simulates a hung page).
    pub fn with_conversion_delay(mut self, delay: Duration) -> Self {
        self.conversion_delay = delay;
        self
    }

    /// Bytes returned by successful conversions.
    pub fn with_pdf_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.pdf_bytes = Arc::new(bytes);
        self
    }

    /// Make every conversion fail with `error`.
    pub fn with_conversion_error(mut self, error: ConversionError) -> Self {
        self.conversion_error = Some(error);
        self
    }

    /// Make pings (smoke tests and liveness checks) fail or succeed.
    pub fn set_ping_failing(&self, failing: bool) {
        self.shared.ping_failing.store(failing, Ordering::SeqCst);
    }

    /// Make launches fail or succeed.
    pub fn set_launch_failing(&self, failing: bool) {
        self.shared.launch_failing.store(failing, Ordering::SeqCst);
    }

    /// Launch attempts so far, successful or not.
    pub fn launch_count(&self) -> usize {
        self.shared.launches.load(Ordering::SeqCst)
    }

    /// Calls to [`BrowserProcess::terminate`] across all processes.
    pub fn terminate_count(&self) -> usize {
        self.shared.terminations.load(Ordering::SeqCst)
    }

    /// Pings across all processes, smoke tests included.
    pub fn ping_count(&self) -> usize {
        self.shared.pings.load(Ordering::SeqCst)
    }

    /// Conversions started across all processes.
    pub fn conversion_count(&self) -> usize {
        self.shared.conversions.load(Ordering::SeqCst)
    }

    /// Processes currently starting or running.
    pub fn live_count(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    /// Highest [`live_count`](Self::live_count) seen so far.
    pub fn max_live_count(&self) -> usize {
        self.shared.max_live.load(Ordering::SeqCst)
    }

    fn launch_fails(&self, attempt: usize) -> bool {
        if self.shared.launch_failing.load(Ordering::SeqCst) {
            return true;
        }
        if attempt < self.fail_first {
            return true;
        }
        matches!(self.fail_after, Some(n) if attempt >= n)
    }
}

impl Default for MockBrowserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserFactory for MockBrowserFactory {
    fn create(&self) -> Result<Box<dyn BrowserProcess>> {
        let attempt = self.shared.launches.fetch_add(1, Ordering::SeqCst);
        let live = self.shared.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_live.fetch_max(live, Ordering::SeqCst);

        if !self.launch_delay.is_zero() {
            std::thread::sleep(self.launch_delay);
        }

        if self.launch_fails(attempt) {
            self.shared.live.fetch_sub(1, Ordering::SeqCst);
            log::debug!("MockBrowserFactory: failing launch #{}", attempt + 1);
            return Err(PoolError::BrowserLaunch(self.error_message.clone()));
        }

        log::debug!("MockBrowserFactory: launched mock process #{}", attempt + 1);
        Ok(Box::new(MockProcess {
            pid: 10_000 + attempt as u32,
            terminated: AtomicBool::new(false),
            factory: self.clone(),
        }))
    }
}

impl std::fmt::Debug for MockBrowserFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBrowserFactory")
            .field("error_message", &self.error_message)
            .field("fail_after", &self.fail_after)
            .field("fail_first", &self.fail_first)
            .field("launches", &self.launch_count())
            .field("terminations", &self.terminate_count())
            .finish_non_exhaustive()
    }
}

/// Process launched by [`MockBrowserFactory`].
struct MockProcess {
    pid: u32,
    terminated: AtomicBool,
    factory: MockBrowserFactory,
}

impl Healthcheck for MockProcess {
    fn ping(&self, _timeout: Duration) -> Result<()> {
        self.factory.shared.pings.fetch_add(1, Ordering::SeqCst);

        if self.terminated.load(Ordering::SeqCst) {
            return Err(PoolError::HealthCheckFailed("process terminated".to_string()));
        }
        if self.factory.shared.ping_failing.load(Ordering::SeqCst) {
            return Err(PoolError::HealthCheckFailed("mock ping failure".to_string()));
        }
        Ok(())
    }
}

impl BrowserProcess for MockProcess {
    fn print_to_pdf(
        &self,
        _url: &str,
        _options: &PdfOptions,
        _timeout: Duration,
    ) -> std::result::Result<Vec<u8>, ConversionError> {
        self.factory.shared.conversions.fetch_add(1, Ordering::SeqCst);

        if !self.factory.conversion_delay.is_zero() {
            std::thread::sleep(self.factory.conversion_delay);
        }
        if self.terminated.load(Ordering::SeqCst) {
            return Err(ConversionError::BrowserUnavailable(
                "process terminated".to_string(),
            ));
        }
        if let Some(err) = &self.factory.conversion_error {
            return Err(err.clone());
        }
        Ok(self.factory.pdf_bytes.as_ref().clone())
    }

    fn terminate(&self) -> Result<()> {
        self.factory.shared.terminations.fetch_add(1, Ordering::SeqCst);
        if !self.terminated.swap(true, Ordering::SeqCst) {
            self.factory.shared.live.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn process_id(&self) -> Option<u32> {
        Some(self.pid)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
