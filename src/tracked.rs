//! Tracked browser with lifecycle metadata.
//!
//! ```text
//! TrackedBrowser
//! ├── id: u64 (unique, monotonically assigned)
//! ├── process: Box<dyn BrowserProcess>
//! ├── created_at: Instant
//! └── terminated: AtomicBool (termination guard)
//! ```
//!
//! The pool stores an `Arc<TrackedBrowser>` in its instance state and hands
//! out clones of that `Arc` inside [`BrowserHandle`](crate::BrowserHandle)s.
//! Termination goes through [`TrackedBrowser::terminate`], which forwards to
//! the process at most once.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::traits::{BrowserProcess, Healthcheck};

pub(crate) struct TrackedBrowser {
    id: u64,

    process: Box<dyn BrowserProcess>,

    created_at: Instant,

    terminated: AtomicBool,
}

impl TrackedBrowser {
    pub(crate) fn new(process: Box<dyn BrowserProcess>, created_at: Instant) -> Self {
        // Thread-safe monotonic ID generator
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        Self {
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
            process,
            created_at,
            terminated: AtomicBool::new(false),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub(crate) fn process(&self) -> &(dyn BrowserProcess + 'static) {
        self.process.as_ref()
    }

    #[inline]
    pub(crate) fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    #[inline]
    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Terminate the underlying process.
    ///
    /// Returns `Ok(false)` if an earlier call already did it.
    pub(crate) fn terminate(&self) -> Result<bool> {
        if self.terminated.swap(true, Ordering::AcqRel) {
            log::trace!("Browser {} already terminated", self.id);
            return Ok(false);
        }

        log::debug!(
            "Terminating browser {} (pid: {:?})",
            self.id,
            self.process.process_id()
        );
        self.process.terminate()?;
        Ok(true)
    }
}

impl Healthcheck for TrackedBrowser {
    fn ping(&self, timeout: Duration) -> Result<()> {
        log::trace!("Pinging browser {}...", self.id);
        self.process.ping(timeout)
    }
}

impl std::fmt::Debug for TrackedBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedBrowser")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("terminated", &self.is_terminated())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::BrowserFactory;
    use crate::factory::mock::MockBrowserFactory;

    fn tracked(factory: &MockBrowserFactory) -> TrackedBrowser {
        TrackedBrowser::new(factory.create().unwrap(), Instant::now())
    }

    #[test]
    fn test_ids_are_unique() {
        let factory = MockBrowserFactory::new();
        let a = tracked(&factory);
        let b = tracked(&factory);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_terminate_reaches_process_once() {
        let factory = MockBrowserFactory::new();
        let browser = tracked(&factory);

        assert!(browser.terminate().unwrap());
        assert!(!browser.terminate().unwrap());
        assert!(browser.is_terminated());
        assert_eq!(factory.terminate_count(), 1);
    }

    #[test]
    fn test_age_saturates() {
        let factory = MockBrowserFactory::new();
        let created = Instant::now();
        let browser = TrackedBrowser::new(factory.create().unwrap(), created);

        assert_eq!(browser.age(created + Duration::from_secs(61)).as_secs(), 61);
        assert_eq!(browser.age(created), Duration::ZERO);
        // A clock reading before creation is clamped to zero
        if let Some(earlier) = created.checked_sub(Duration::from_secs(1)) {
            assert_eq!(browser.age(earlier), Duration::ZERO);
        }
    }
}
