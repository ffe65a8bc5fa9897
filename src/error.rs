//! Error types for the browser instance manager and the conversion service.
//!
//! Two enums cover the whole crate:
//!
//! - [`PoolError`] for lifecycle operations on the shared browser
//!   ([`BrowserPool::ensure_ready`](crate::BrowserPool::ensure_ready),
//!   [`BrowserPool::acquire`](crate::BrowserPool::acquire), ...).
//! - [`ConversionError`] for a single Markdown → PDF conversion.
//!
//! Neither is fatal to the service. Initialization failures are retried by
//! the startup routine and the [`HealthMonitor`](crate::HealthMonitor);
//! conversion failures are reported to the HTTP caller.
//!
//! # Example
//!
//! ```rust
//! use md2pdf_server::{PoolError, Result};
//!
//! fn launch() -> Result<()> {
//!     Err(PoolError::BrowserLaunch("chrome not found".to_string()))
//! }
//!
//! match launch() {
//!     Ok(()) => println!("ready"),
//!     Err(e) if e.is_init_error() => eprintln!("will retry later: {}", e),
//!     Err(e) => eprintln!("error: {}", e),
//! }
//! ```

use std::time::Duration;

/// Errors that can occur while managing the shared browser instance.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The browser process could not be started.
    ///
    /// Typically a missing Chrome/Chromium binary, bad launch flags, or
    /// exhausted system resources.
    ///
    /// ```rust
    /// use md2pdf_server::PoolError;
    ///
    /// let error = PoolError::BrowserLaunch("Chrome binary not found".to_string());
    /// assert_eq!(error.to_string(), "Failed to launch browser: Chrome binary not found");
    /// ```
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    /// The process started but did not pass its smoke test.
    ///
    /// The half-started process has already been terminated when this is
    /// returned.
    #[error("Browser smoke test failed: {0}")]
    SmokeTestFailed(String),

    /// Launch plus smoke test did not finish within the init timeout.
    #[error("Browser initialization timed out after {}s", .0.as_secs())]
    InitTimeout(Duration),

    /// A live browser stopped answering health checks.
    #[error("Browser health check failed: {0}")]
    HealthCheckFailed(String),

    /// A handle was requested before initialization succeeded.
    ///
    /// Call [`BrowserPool::ensure_ready`](crate::BrowserPool::ensure_ready)
    /// first.
    #[error("Browser instance is not ready")]
    NotReady,

    /// Operation attempted after [`BrowserPool::shutdown`](crate::BrowserPool::shutdown).
    #[error("Pool is shutting down")]
    ShuttingDown,

    /// Invalid configuration provided.
    ///
    /// ```rust
    /// use md2pdf_server::PoolError;
    ///
    /// let error = PoolError::Configuration("idle_ttl must be greater than 0".to_string());
    /// assert_eq!(error.to_string(), "Configuration error: idle_ttl must be greater than 0");
    /// ```
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PoolError {
    /// Returns `true` for failures of a single initialization attempt.
    ///
    /// These leave the pool uninitialized and are safe to retry.
    pub fn is_init_error(&self) -> bool {
        matches!(
            self,
            Self::BrowserLaunch(_) | Self::SmokeTestFailed(_) | Self::InitTimeout(_)
        )
    }
}

impl From<String> for PoolError {
    fn from(msg: String) -> Self {
        PoolError::Configuration(msg)
    }
}

impl From<&str> for PoolError {
    fn from(msg: &str) -> Self {
        PoolError::Configuration(msg.to_string())
    }
}

/// Result type alias using [`PoolError`].
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors that can occur while converting a document.
///
/// Every variant maps to a 5xx status: nothing a caller sends is rejected,
/// an empty body converts to an empty document.
///
/// | Variant | HTTP Status | Error Code |
/// |---------|-------------|------------|
/// | [`BrowserUnavailable`](Self::BrowserUnavailable) | 503 | `BROWSER_UNAVAILABLE` |
/// | [`TabCreationFailed`](Self::TabCreationFailed) | 500 | `TAB_CREATION_FAILED` |
/// | [`NavigationFailed`](Self::NavigationFailed) | 502 | `NAVIGATION_FAILED` |
/// | [`PdfGenerationFailed`](Self::PdfGenerationFailed) | 502 | `PDF_GENERATION_FAILED` |
/// | [`Timeout`](Self::Timeout) | 504 | `TIMEOUT` |
/// | [`Internal`](Self::Internal) | 500 | `INTERNAL_ERROR` |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// The browser could not be initialized or acquired.
    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(String),

    /// Opening a tab on the shared browser failed.
    #[error("Failed to create tab: {0}")]
    TabCreationFailed(String),

    /// Loading the rendered document failed.
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// The print-to-PDF call failed.
    #[error("PDF generation failed: {0}")]
    PdfGenerationFailed(String),

    /// The whole conversion exceeded its deadline.
    #[error("Conversion timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Unexpected failure, e.g. a panicked worker task.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConversionError {
    /// HTTP status code for this error.
    ///
    /// ```rust
    /// use md2pdf_server::ConversionError;
    /// use std::time::Duration;
    ///
    /// assert_eq!(ConversionError::BrowserUnavailable("down".into()).status_code(), 503);
    /// assert_eq!(ConversionError::Timeout(Duration::from_secs(30)).status_code(), 504);
    /// ```
    pub fn status_code(&self) -> u16 {
        match self {
            Self::TabCreationFailed(_) | Self::Internal(_) => 500,
            Self::NavigationFailed(_) | Self::PdfGenerationFailed(_) => 502,
            Self::BrowserUnavailable(_) => 503,
            Self::Timeout(_) => 504,
        }
    }

    /// Stable machine-readable code, for logs and clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BrowserUnavailable(_) => "BROWSER_UNAVAILABLE",
            Self::TabCreationFailed(_) => "TAB_CREATION_FAILED",
            Self::NavigationFailed(_) => "NAVIGATION_FAILED",
            Self::PdfGenerationFailed(_) => "PDF_GENERATION_FAILED",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<PoolError> for ConversionError {
    fn from(err: PoolError) -> Self {
        ConversionError::BrowserUnavailable(err.to_string())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
