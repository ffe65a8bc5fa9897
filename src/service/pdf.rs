//! Core Markdown to PDF conversion.
//!
//! [`convert_markdown_to_pdf`] is **blocking**: it may launch the browser
//! and then waits on the DevTools protocol. From async code use
//! [`convert_markdown_to_pdf_async`], which moves the work to the blocking
//! thread pool and enforces an overall deadline.
//!
//! # Flow
//!
//! ```text
//! markdown bytes
//!   → pool.ensure_ready()   (launch only if no live browser)
//!   → pool.acquire() + pool.touch()
//!   → markdown::render()    → data:text/html;charset=utf-8,<encoded>
//!   → browser.print_to_pdf()
//!   → PdfResponse
//! ```
//!
//! A failed conversion never resets the pool. One bad document is not
//! proof the shared browser is broken; the health monitor decides that.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ConversionError;
use crate::pool::BrowserPool;
use crate::service::markdown;
use crate::service::types::{HealthResponse, PdfOptions, PdfResponse};

/// Prefix of the data URL the rendered HTML is loaded from.
const DATA_URL_PREFIX: &str = "data:text/html;charset=utf-8,";

/// Build the data URL for an HTML document.
pub fn html_data_url(html: &str) -> String {
    let encoded = urlencoding::encode(html);
    let mut url = String::with_capacity(DATA_URL_PREFIX.len() + encoded.len());
    url.push_str(DATA_URL_PREFIX);
    url.push_str(&encoded);
    url
}

/// Convert a Markdown document to PDF.
///
/// Uses [`PoolConfig::conversion_timeout`](crate::PoolConfig::conversion_timeout)
/// as the browser-side timeout for each protocol step.
///
/// # Blocking
///
/// Blocks the calling thread. Do not call directly from an async task.
///
/// # Errors
///
/// - [`ConversionError::BrowserUnavailable`] - no browser could be made ready
/// - [`ConversionError::TabCreationFailed`], [`ConversionError::NavigationFailed`],
///   [`ConversionError::PdfGenerationFailed`] - the protocol call sequence failed
pub fn convert_markdown_to_pdf(
    pool: &BrowserPool,
    markdown_source: &[u8],
) -> Result<PdfResponse, ConversionError> {
    let started = Instant::now();

    if !pool.is_ready() {
        log::info!("Browser not ready, initializing before conversion");
        pool.ensure_ready()?;
    }

    let browser = pool.acquire()?;
    pool.touch();

    let html = markdown::render(markdown_source);
    let url = html_data_url(&html);

    log::debug!(
        "Converting {} bytes of Markdown ({} bytes of HTML) with browser {}",
        markdown_source.len(),
        html.len(),
        browser.id()
    );

    let timeout = pool.config().conversion_timeout;
    let response = PdfResponse::new(browser.print_to_pdf(&url, &PdfOptions::default(), timeout)?);

    log::info!(
        "✅ PDF generated ({} bytes) in {:?}",
        response.size(),
        started.elapsed()
    );

    Ok(response)
}

/// Run [`convert_markdown_to_pdf`] on the blocking pool with a deadline.
///
/// On timeout the caller gets [`ConversionError::Timeout`] right away. The
/// blocking work is abandoned, not cancelled: the browser keeps running
/// and the pool state is left alone.
///
/// # Errors
///
/// Anything [`convert_markdown_to_pdf`] returns, plus
/// [`ConversionError::Timeout`] and [`ConversionError::Internal`] if the
/// blocking task panicked.
pub async fn convert_markdown_to_pdf_async(
    pool: Arc<BrowserPool>,
    markdown_source: Vec<u8>,
    timeout: Duration,
) -> Result<PdfResponse, ConversionError> {
    let task =
        tokio::task::spawn_blocking(move || convert_markdown_to_pdf(&pool, &markdown_source));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => {
            log::error!("Conversion task failed: {}", join_error);
            Err(ConversionError::Internal(format!(
                "conversion task failed: {}",
                join_error
            )))
        }
        Err(_) => {
            log::error!("Conversion timed out after {:?}", timeout);
            Err(ConversionError::Timeout(timeout))
        }
    }
}

/// Health payload for the pool.
///
/// Never launches and never waits on the pool's state lock, so it is safe
/// to call from an async handler while an initialization is running.
pub fn health_status(pool: &BrowserPool) -> HealthResponse {
    HealthResponse::new(pool.is_ready_nonblocking(), pool.last_used_at())
}

// ============================================================================
// Unit Tests
// ============================================================================
