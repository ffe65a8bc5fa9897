//! Convenient imports for common usage patterns.
//!
//! ```rust,ignore
//! use md2pdf_server::prelude::*;
//! ```
//!
//! Brings in the pool and its builder, configuration, errors, the health
//! monitor, the Chrome factory, the service entry points and `Arc`.

pub use crate::SharedBrowserPool;
pub use crate::config::{PoolConfig, PoolConfigBuilder};
pub use crate::error::{ConversionError, PoolError, Result};
pub use crate::factory::{BrowserFactory, ChromeBrowserFactory};
pub use crate::handle::BrowserHandle;
pub use crate::monitor::{HealthMonitor, MonitorAction};
pub use crate::pool::{BrowserPool, BrowserPoolBuilder};
pub use crate::retry::{DelayStrategy, RetryPolicy};
pub use crate::service::{
    PdfOptions, PdfResponse, convert_markdown_to_pdf, convert_markdown_to_pdf_async,
};
pub use crate::stats::PoolStats;
pub use crate::traits::{BrowserProcess, Healthcheck};

#[cfg(feature = "env-config")]
pub use crate::config::env::{chrome_path_from_env, from_env};

#[cfg(feature = "env-config")]
pub use crate::pool::init_browser_pool;

pub use std::sync::Arc;
