//! Lease on the shared browser.
//!
//! [`BrowserPool::acquire`](crate::BrowserPool::acquire) returns a
//! [`BrowserHandle`]. It derefs to [`BrowserProcess`], so callers drive the
//! browser directly:
//!
//! ```rust,ignore
//! pool.ensure_ready()?;
//! let browser = pool.acquire()?;
//! pool.touch();
//! let pdf = browser.print_to_pdf(&url, &PdfOptions::default(), timeout)?;
//! ```
//!
//! Unlike a pooled connection, dropping the handle does nothing to the
//! process: the browser keeps running until the pool resets it. A handle
//! held across a [`reset`](crate::BrowserPool::reset) still points at the
//! old process; calls on it fail once that process is terminated.

use std::sync::Arc;

use crate::tracked::TrackedBrowser;
use crate::traits::BrowserProcess;

/// Non-clonable lease on the live browser process.
pub struct BrowserHandle {
    tracked: Arc<TrackedBrowser>,
}

impl BrowserHandle {
    pub(crate) fn new(tracked: Arc<TrackedBrowser>) -> Self {
        Self { tracked }
    }

    /// Id of the browser instance this handle points at.
    ///
    /// Ids change every time the pool launches a new process.
    pub fn id(&self) -> u64 {
        self.tracked.id()
    }

    /// Whether the pool has terminated the process behind this handle.
    pub fn is_terminated(&self) -> bool {
        self.tracked.is_terminated()
    }
}

impl std::ops::Deref for BrowserHandle {
    type Target = dyn BrowserProcess;

    fn deref(&self) -> &Self::Target {
        self.tracked.process()
    }
}

impl std::fmt::Debug for BrowserHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserHandle")
            .field("id", &self.tracked.id())
            .field("terminated", &self.tracked.is_terminated())
            .finish()
    }
}
