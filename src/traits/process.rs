//! The opaque handle to a running browser process.

use std::time::Duration;

use crate::error::{ConversionError, Result};
use crate::service::PdfOptions;

use super::Healthcheck;

/// A running external browser process plus the capability to stop it.
///
/// The process does not stop on its own: the pool calls
/// [`terminate`](Self::terminate) exactly once per process, during
/// [`BrowserPool::reset`](crate::BrowserPool::reset) or shutdown.
/// Implementations must still tolerate repeated calls and calls from a
/// thread other than the one that launched the process.
pub trait BrowserProcess: Healthcheck {
    /// Load `url` in a fresh tab, wait for `<body>`, and print it to PDF.
    ///
    /// `timeout` bounds each automation step; the conversion service
    /// applies its own overall deadline on top.
    fn print_to_pdf(
        &self,
        url: &str,
        options: &PdfOptions,
        timeout: Duration,
    ) -> std::result::Result<Vec<u8>, ConversionError>;

    /// Stop the process. Safe to call more than once.
    fn terminate(&self) -> Result<()>;

    /// OS process id, if known. Used for logging only.
    fn process_id(&self) -> Option<u32> {
        None
    }
}
