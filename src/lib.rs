//! # md2pdf-server
//!
//! Markdown to PDF over HTTP, backed by one shared headless Chrome.
//!
//! The core of this crate is [`BrowserPool`]: the owner of a single
//! long-lived browser process that every request reuses. It starts the
//! process lazily, validates it with a smoke test before anyone can use it,
//! and guarantees that concurrent requests never launch more than one.
//! A [`HealthMonitor`] thread recovers the browser when it is missing,
//! recycles it after a long idle period, and replaces it when it stops
//! answering pings.
//!
//! ## Features
//!
//! - **Single instance**: at most one live browser process at a time
//! - **Validated initialization**: launch + smoke test under one lock, with
//!   a hard timeout
//! - **Degrade, don't crash**: a browser that cannot start at boot is
//!   retried with backoff, then on demand; the HTTP server starts anyway
//! - **Health monitoring**: recovery, idle recycling and crash detection
//! - **Injected dependencies**: the pool is built explicitly with a
//!   [`BrowserFactory`] and a [`Clock`](clock::Clock), so tests run
//!   without Chrome and without sleeping
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │   HTTP (integrations::axum)                 │
//! │   GET /   POST /utils/convert-pdf   /health │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │   service: markdown → HTML → data URL → PDF │
//! └─────────────────┬───────────────────────────┘
//!                   │ ensure_ready / acquire / touch
//!                   ▼
//! ┌─────────────────────────────────────────────┐      ┌──────────────────┐
//! │              BrowserPool                    │◄─────│  HealthMonitor   │
//! │   RwLock<InstanceState>                     │      │  (thread)        │
//! │   handle · initialized · last_used          │      └──────────────────┘
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │        Headless Chrome (one process)        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use md2pdf_server::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = BrowserPool::builder()
//!         .factory(Box::new(ChromeBrowserFactory::with_defaults()))
//!         .build()?
//!         .into_shared();
//!
//!     if let Err(e) = pool.warmup().await {
//!         log::warn!("Browser unavailable at startup: {}", e);
//!     }
//!
//!     let mut monitor = HealthMonitor::start(Arc::clone(&pool));
//!
//!     let pdf = convert_markdown_to_pdf_async(
//!         Arc::clone(&pool),
//!         b"# Hello".to_vec(),
//!         pool.config().conversion_timeout,
//!     )
//!     .await?;
//!
//!     monitor.stop_async().await;
//!     pool.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Configuration
//!
//! With the `env-config` feature, [`from_env`] reads an optional `app.env`
//! file and then the process environment:
//!
//! | Variable | Type | Default | Description |
//! |----------|------|---------|-------------|
//! | `MD2PDF_HEALTH_INTERVAL_SECONDS` | u64 | 30 | Health monitor interval |
//! | `MD2PDF_IDLE_TTL_SECONDS` | u64 | 3600 | Idle time before recycling |
//! | `MD2PDF_INIT_TIMEOUT_SECONDS` | u64 | 30 | Launch + smoke test limit |
//! | `MD2PDF_CONVERSION_TIMEOUT_SECONDS` | u64 | 30 | Per-conversion deadline |
//! | `MD2PDF_MAX_PING_FAILURES` | u32 | 3 | Failed pings before recycling |
//! | `MD2PDF_STARTUP_ATTEMPTS` | u32 | 5 | Initialization attempts at boot |
//! | `CHROME_PATH` | String | auto | Custom Chrome binary path |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `env-config` | Environment-based configuration (default) |
//! | `axum-integration` | HTTP router and the binary (default) |
//! | `test-utils` | Mock factory and manual clock for testing |
//!
//! ## Testing
//!
//! Enable `test-utils` and use
//! [`MockBrowserFactory`](factory::mock::MockBrowserFactory):
//!
//! ```rust,ignore
//! use md2pdf_server::factory::mock::MockBrowserFactory;
//!
//! let factory = MockBrowserFactory::fails_smoke_test();
//! let pool = BrowserPool::builder()
//!     .factory(Box::new(factory.clone()))
//!     .build()?;
//!
//! assert!(matches!(pool.ensure_ready(), Err(PoolError::SmokeTestFailed(_))));
//! assert_eq!(factory.terminate_count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// Modules
// ============================================================================

pub mod clock;
pub mod config;
pub mod error;
pub mod factory;
pub mod handle;
pub mod monitor;
pub mod pool;
pub mod prelude;
pub mod retry;
pub mod service;
pub mod stats;
pub mod traits;

pub(crate) mod tracked;

// ============================================================================
// Feature-gated modules
// ============================================================================

/// HTTP integrations. Enable `axum-integration`.
#[cfg(feature = "axum-integration")]
pub mod integrations;

// ============================================================================
// Re-exports (Public API)
// ============================================================================

pub use config::{PoolConfig, PoolConfigBuilder};
pub use error::{ConversionError, PoolError, Result};
pub use factory::{BrowserFactory, ChromeBrowserFactory, create_chrome_options};
pub use handle::BrowserHandle;
pub use monitor::{HealthMonitor, MonitorAction};
pub use pool::{BrowserPool, BrowserPoolBuilder};
pub use retry::{DelayStrategy, RetryPolicy};
pub use service::{HealthResponse, PdfOptions, PdfResponse};
pub use stats::PoolStats;
pub use traits::{BrowserProcess, Healthcheck};

#[cfg(feature = "env-config")]
pub use config::env::{chrome_path_from_env, from_env};

#[cfg(feature = "env-config")]
pub use pool::init_browser_pool;

// ============================================================================
// Convenience type aliases
// ============================================================================

/// The pool as shared with HTTP handlers and the health monitor.
///
/// ```rust,ignore
/// let pool: SharedBrowserPool = BrowserPool::builder()
///     .factory(Box::new(ChromeBrowserFactory::with_defaults()))
///     .build()?
///     .into_shared();
/// ```
pub type SharedBrowserPool = std::sync::Arc<BrowserPool>;
