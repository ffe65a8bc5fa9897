//! Browser factory implementations.
//!
//! This module provides the [`BrowserFactory`] trait and implementations
//! for launching the browser process the pool manages.
//!
//! # Available Factories
//!
//! | Factory | Description |
//! |---------|-------------|
//! | [`ChromeBrowserFactory`] | Launches headless Chrome/Chromium |
//! | [`mock::MockBrowserFactory`] | In-memory fake for tests (feature-gated) |
//!
//! # Example
//!
//! ```rust,ignore
//! use md2pdf_server::{BrowserFactory, ChromeBrowserFactory};
//!
//! let factory = ChromeBrowserFactory::with_defaults();
//! let process = factory.create()?;
//! ```
//!
//! A factory only launches. Validating the new process (the smoke test)
//! and terminating it on failure is the pool's job, so every factory gets
//! the same treatment.

mod chrome;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use chrome::{ChromeBrowserFactory, ChromeProcess, create_chrome_options};

use crate::error::Result;
use crate::traits::BrowserProcess;

/// Trait for launching browser processes.
///
/// # Thread Safety
///
/// Requires `Send + Sync`: the pool calls [`create`](Self::create) from a
/// dedicated launcher thread.
///
/// # Implementors
///
/// - [`ChromeBrowserFactory`] - Launches Chrome/Chromium
/// - [`mock::MockBrowserFactory`] - For testing (when `test-utils` feature enabled)
pub trait BrowserFactory: Send + Sync {
    /// Launch a new browser process.
    ///
    /// # Errors
    ///
    /// - [`PoolError::Configuration`](crate::PoolError::Configuration) -
    ///   invalid launch options
    /// - [`PoolError::BrowserLaunch`](crate::PoolError::BrowserLaunch) -
    ///   binary not found, launch fails, etc.
    fn create(&self) -> Result<Box<dyn BrowserProcess>>;
}
