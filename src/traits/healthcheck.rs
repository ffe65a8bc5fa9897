//! Health check trait for browser processes.
//!
//! One check serves two purposes:
//!
//! 1. **Smoke test**: run once on a freshly launched process before the
//!    pool marks it ready.
//! 2. **Liveness ping**: run by the [`HealthMonitor`](crate::HealthMonitor)
//!    on every cycle against the live instance.
//!
//! The Chrome implementation opens a tab, navigates it to `about:blank` and
//! closes it again, which proves the process is alive and the CDP
//! (Chrome DevTools Protocol) connection works.

use std::time::Duration;

use crate::error::Result;

/// Trait for browser-like objects that support health checking.
///
/// # Thread Safety
///
/// Requires `Send + Sync`: the monitor pings the process from its own
/// thread while request handlers use it from others.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use md2pdf_server::{Healthcheck, PoolError, Result};
/// use std::time::Duration;
///
/// struct MyBrowser {
///     inner: SomeBrowserType,
/// }
///
/// impl Healthcheck for MyBrowser {
///     fn ping(&self, timeout: Duration) -> Result<()> {
///         let tab = self.inner.new_tab_with_timeout(timeout)
///             .map_err(|e| PoolError::HealthCheckFailed(e.to_string()))?;
///         let _ = tab.close();
///         Ok(())
///     }
/// }
/// ```
pub trait Healthcheck: Send + Sync {
    /// Perform a health check, giving up after `timeout`.
    ///
    /// # Implementation Guidelines
    ///
    /// - **Keep it fast**: it runs every monitor cycle
    /// - **Be idempotent**: multiple calls must be safe
    /// - **Clean up**: close any tab opened for the check
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::HealthCheckFailed`](crate::PoolError::HealthCheckFailed)
    /// if the process is unresponsive or gone.
    fn ping(&self, timeout: Duration) -> Result<()>;
}
