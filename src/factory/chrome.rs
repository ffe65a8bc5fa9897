//! Chrome/Chromium browser factory implementation.
//!
//! [`ChromeBrowserFactory`] launches a headless Chrome with flags suited to
//! a server: no sandbox, no GPU, no shared-memory dependency, and every
//! auxiliary feature that slows startup turned off.
//!
//! # Example
//!
//! ```rust,ignore
//! use md2pdf_server::ChromeBrowserFactory;
//!
//! // Auto-detect Chrome installation
//! let factory = ChromeBrowserFactory::with_defaults();
//!
//! // Or specify custom path
//! let factory = ChromeBrowserFactory::with_path("/usr/bin/chromium".to_string());
//! ```

use std::sync::RwLock;
use std::time::Duration;

use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};

use super::BrowserFactory;
use crate::error::{ConversionError, PoolError, Result};
use crate::service::PdfOptions;
use crate::traits::{BrowserProcess, Healthcheck};

/// How long headless_chrome keeps the DevTools connection open without
/// events. The health monitor pings far more often than this.
const BROWSER_IDLE_TIMEOUT: Duration = Duration::from_secs(24 * 3600);

/// Page used by the smoke test and the liveness ping.
const PING_URL: &str = "about:blank";

/// Factory for launching headless Chrome.
///
/// Launch options are produced by a closure so the binary path can be
/// decided at construction time.
pub struct ChromeBrowserFactory {
    launch_options_fn: Box<dyn Fn() -> Result<LaunchOptions<'static>> + Send + Sync>,
}

impl ChromeBrowserFactory {
    /// Create a factory from a launch-options closure.
    pub fn new<F>(launch_options_fn: F) -> Self
    where
        F: Fn() -> Result<LaunchOptions<'static>> + Send + Sync + 'static,
    {
        Self {
            launch_options_fn: Box::new(launch_options_fn),
        }
    }

    /// Factory that lets headless_chrome find the Chrome binary.
    pub fn with_defaults() -> Self {
        log::debug!("Creating ChromeBrowserFactory with auto-detect");
        Self::new(|| {
            create_chrome_options(None).map_err(|e| PoolError::Configuration(e.to_string()))
        })
    }

    /// Factory using the Chrome binary at `chrome_path`.
    pub fn with_path(chrome_path: String) -> Self {
        log::debug!("Creating ChromeBrowserFactory with custom path: {}", chrome_path);
        Self::new(move || {
            create_chrome_options(Some(&chrome_path))
                .map_err(|e| PoolError::Configuration(e.to_string()))
        })
    }
}

impl BrowserFactory for ChromeBrowserFactory {
    fn create(&self) -> Result<Box<dyn BrowserProcess>> {
        log::trace!("ChromeBrowserFactory::create() called");

        let options = (self.launch_options_fn)()?;

        log::debug!("Launching Chrome browser...");
        let browser = Browser::new(options).map_err(|e| {
            log::error!("❌ Chrome launch failed: {}", e);
            PoolError::BrowserLaunch(e.to_string())
        })?;

        log::debug!("Chrome launched (pid: {:?})", browser.get_process_id());
        Ok(Box::new(ChromeProcess::new(browser)))
    }
}

/// Build launch options for a server-side headless Chrome.
///
/// # Errors
///
/// Fails only if headless_chrome rejects the option set.
pub fn create_chrome_options(
    chrome_path: Option<&str>,
) -> std::result::Result<LaunchOptions<'static>, Box<dyn std::error::Error + Send + Sync>> {
    match chrome_path {
        Some(path) => log::debug!("Creating Chrome options with custom path: {}", path),
        None => log::debug!("Creating Chrome options (auto-detect browser)"),
    }

    let mut builder = LaunchOptions::default_builder();

    if let Some(path) = chrome_path {
        builder.path(Some(path.to_string().into()));
    }

    builder
        .headless(true)
        .sandbox(false) // required in containers
        .disable_default_args(true)
        .idle_browser_timeout(BROWSER_IDLE_TIMEOUT)
        .args(vec![
            // ===== Server environment =====
            "--disable-gpu".as_ref(),
            "--disable-dev-shm-usage".as_ref(), // /tmp instead of /dev/shm
            "--disable-crash-reporter".as_ref(),
            "--no-first-run".as_ref(),
            "--no-default-browser-check".as_ref(),
            // ===== Disable Unnecessary Features =====
            "--disable-extensions".as_ref(),
            "--disable-plugins".as_ref(),
            "--disable-sync".as_ref(),
            "--disable-default-apps".as_ref(),
            "--disable-background-networking".as_ref(),
            "--blink-settings=imagesEnabled=false".as_ref(),
            // ===== Local documents only =====
            "--disable-web-security".as_ref(),
            "--ignore-certificate-errors".as_ref(),
            // ===== Keep the single tab responsive =====
            "--disable-background-timer-throttling".as_ref(),
            "--disable-renderer-backgrounding".as_ref(),
            "--disable-backgrounding-occluded-windows".as_ref(),
            "--disable-hang-monitor".as_ref(),
            "--disable-ipc-flooding-protection".as_ref(),
        ])
        .build()
        .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
            let path_msg = chrome_path.unwrap_or("auto-detect");
            log::error!(
                "Failed to build Chrome launch options (path: {}): {}",
                path_msg,
                e
            );
            e.into()
        })
}

/// A running Chrome process.
///
/// The [`Browser`] sits in an `RwLock<Option<_>>`. Work clones it out
/// (cheap, reference counted) and releases the lock before any CDP call;
/// [`terminate`](BrowserProcess::terminate) takes it out. Chrome exits
/// when the last clone is dropped, so an in-flight conversion finishes or
/// fails on its own before the process goes away.
pub struct ChromeProcess {
    browser: RwLock<Option<Browser>>,
    pid: Option<u32>,
}

impl ChromeProcess {
    /// Wrap a launched browser.
    pub fn new(browser: Browser) -> Self {
        let pid = browser.get_process_id();
        Self {
            browser: RwLock::new(Some(browser)),
            pid,
        }
    }

    fn browser(&self) -> Option<Browser> {
        self.browser
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .cloned()
    }

    fn render(
        tab: &Tab,
        url: &str,
        options: &PdfOptions,
    ) -> std::result::Result<Vec<u8>, ConversionError> {
        log::trace!("Navigating to document ({} bytes of URL)", url.len());
        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| {
                log::error!("Failed to navigate to document: {}", e);
                ConversionError::NavigationFailed(e.to_string())
            })?;

        tab.wait_for_element("body").map_err(|e| {
            log::error!("Document body never became available: {}", e);
            ConversionError::NavigationFailed(e.to_string())
        })?;

        tab.print_to_pdf(Some(print_options(options))).map_err(|e| {
            log::error!("❌ Failed to generate PDF: {}", e);
            ConversionError::PdfGenerationFailed(e.to_string())
        })
    }
}

impl Healthcheck for ChromeProcess {
    fn ping(&self, timeout: Duration) -> Result<()> {
        let browser = self
            .browser()
            .ok_or_else(|| PoolError::HealthCheckFailed("browser terminated".to_string()))?;

        let tab = browser.new_tab().map_err(|e| {
            log::warn!("⚠️ Chrome ping failed (new_tab): {}", e);
            PoolError::HealthCheckFailed(e.to_string())
        })?;
        tab.set_default_timeout(timeout);

        let result = tab
            .navigate_to(PING_URL)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ())
            .map_err(|e| {
                log::warn!("Chrome ping failed (navigate): {}", e);
                PoolError::HealthCheckFailed(e.to_string())
            });

        close_tab_safely(&tab);
        result
    }
}

impl BrowserProcess for ChromeProcess {
    fn print_to_pdf(
        &self,
        url: &str,
        options: &PdfOptions,
        timeout: Duration,
    ) -> std::result::Result<Vec<u8>, ConversionError> {
        let browser = self.browser().ok_or_else(|| {
            ConversionError::BrowserUnavailable("browser terminated".to_string())
        })?;

        let tab = browser.new_tab().map_err(|e| {
            log::error!("Failed to create tab: {}", e);
            ConversionError::TabCreationFailed(e.to_string())
        })?;
        tab.set_default_timeout(timeout);

        let result = Self::render(&tab, url, options);
        close_tab_safely(&tab);
        result
    }

    fn terminate(&self) -> Result<()> {
        let browser = self
            .browser
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        match browser {
            Some(browser) => {
                log::info!(" Stopping Chrome (pid: {:?})", self.pid);
                drop(browser);
            }
            None => log::trace!("Chrome (pid: {:?}) already stopped", self.pid),
        }
        Ok(())
    }

    fn process_id(&self) -> Option<u32> {
        self.pid
    }
}

fn print_options(options: &PdfOptions) -> PrintToPdfOptions {
    PrintToPdfOptions {
        landscape: Some(options.landscape),
        display_header_footer: Some(false),
        print_background: Some(options.print_background),
        margin_top: Some(options.margin_inches),
        margin_bottom: Some(options.margin_inches),
        margin_left: Some(options.margin_inches),
        margin_right: Some(options.margin_inches),
        prefer_css_page_size: Some(options.prefer_css_page_size),
        ..Default::default()
    }
}

fn close_tab_safely(tab: &Tab) {
    if let Err(e) = tab.close(true) {
        log::warn!("⚠️ Failed to close tab (continuing anyway): {}", e);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
