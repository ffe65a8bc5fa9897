//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use md2pdf_server::clock::ManualClock;
use md2pdf_server::factory::mock::MockBrowserFactory;
use md2pdf_server::prelude::*;

/// Bytes the mock browser returns in tests that check the response body.
pub const STUB_PDF: &[u8] = b"%PDF-1.4\n%stub\n%%EOF\n";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Config with short delays so retry loops finish quickly.
pub fn fast_config() -> PoolConfig {
    PoolConfigBuilder::new()
        .init_timeout(Duration::from_secs(5))
        .conversion_timeout(Duration::from_secs(5))
        .startup_retry(RetryPolicy::new(5, DelayStrategy::Linear(Duration::from_millis(10))))
        .recovery_retry(RetryPolicy::immediate(1))
        .build()
        .expect("valid test config")
}

pub fn pool_with(factory: &MockBrowserFactory) -> SharedBrowserPool {
    pool_with_config(factory, fast_config())
}

pub fn pool_with_config(factory: &MockBrowserFactory, config: PoolConfig) -> SharedBrowserPool {
    init_logging();
    BrowserPool::builder()
        .config(config)
        .factory(Box::new(factory.clone()))
        .build()
        .expect("pool builds")
        .into_shared()
}

pub fn pool_with_clock(
    factory: &MockBrowserFactory,
    config: PoolConfig,
    clock: Arc<ManualClock>,
) -> SharedBrowserPool {
    init_logging();
    BrowserPool::builder()
        .config(config)
        .factory(Box::new(factory.clone()))
        .clock(clock)
        .build()
        .expect("pool builds")
        .into_shared()
}
