//! Health monitor tests, driven by a manual clock.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{fast_config, pool_with, pool_with_clock, pool_with_config};
use md2pdf_server::clock::ManualClock;
use md2pdf_server::factory::mock::MockBrowserFactory;
use md2pdf_server::prelude::*;

fn ttl_config(ttl: Duration) -> PoolConfig {
    PoolConfigBuilder::new()
        .idle_ttl(ttl)
        .recovery_retry(RetryPolicy::immediate(1))
        .build()
        .unwrap()
}

/// One tick on a stale instance: exactly one reset, then one launch.
#[test]
fn test_stale_instance_is_recycled_once() {
    let factory = MockBrowserFactory::new();
    let clock = Arc::new(ManualClock::new());
    let pool = pool_with_clock(&factory, ttl_config(Duration::from_secs(3600)), clock.clone());
    let monitor = HealthMonitor::new(Arc::clone(&pool));

    pool.ensure_ready().unwrap();
    clock.advance(Duration::from_secs(3601));

    assert_eq!(monitor.run_cycle(), MonitorAction::Recycled);

    let stats = pool.stats();
    assert_eq!(stats.resets, 1);
    assert_eq!(stats.launches, 2);
    assert_eq!(factory.terminate_count(), 1);
    assert!(pool.is_ready());

    // Fresh instance: nothing more to do
    assert_eq!(monitor.run_cycle(), MonitorAction::Healthy);
    assert_eq!(pool.stats().resets, 1);
}

/// Use keeps an instance fresh.
#[test]
fn test_touch_prevents_recycling() {
    let factory = MockBrowserFactory::new();
    let clock = Arc::new(ManualClock::new());
    let pool = pool_with_clock(&factory, ttl_config(Duration::from_secs(60)), clock.clone());
    let monitor = HealthMonitor::new(Arc::clone(&pool));
    pool.ensure_ready().unwrap();

    for _ in 0..5 {
        clock.advance(Duration::from_secs(50));
        pool.touch();
        assert_eq!(monitor.run_cycle(), MonitorAction::Healthy);
    }

    assert_eq!(factory.launch_count(), 1);
}

/// An absent instance is brought back by the monitor.
#[test]
fn test_monitor_recovers_after_reset() {
    let factory = MockBrowserFactory::new();
    let pool = pool_with(&factory);
    let monitor = HealthMonitor::new(Arc::clone(&pool));

    pool.ensure_ready().unwrap();
    pool.reset();

    assert_eq!(monitor.run_cycle(), MonitorAction::Recovered);
    assert!(pool.is_ready());
    assert_eq!(factory.launch_count(), 2);
}

/// A crashed browser is replaced after max_ping_failures ticks.
#[test]
fn test_unresponsive_browser_is_replaced() {
    let factory = MockBrowserFactory::new();
    let pool = pool_with(&factory);
    let monitor = HealthMonitor::new(Arc::clone(&pool));
    pool.ensure_ready().unwrap();
    let crashed = pool.acquire().unwrap().id();

    factory.set_ping_failing(true);
    assert_eq!(monitor.run_cycle(), MonitorAction::PingFailed { failures: 1 });
    assert_eq!(monitor.run_cycle(), MonitorAction::PingFailed { failures: 2 });

    // Third strike; the replacement still cannot pass its smoke test
    assert_eq!(monitor.run_cycle(), MonitorAction::RecycleFailed);
    assert!(!pool.is_ready());

    factory.set_ping_failing(false);
    assert_eq!(monitor.run_cycle(), MonitorAction::Recovered);
    assert_ne!(pool.acquire().unwrap().id(), crashed);
}

/// The background thread recovers a missing browser on its own.
#[test]
fn test_background_thread_recovers() {
    let factory = MockBrowserFactory::new();
    let config = PoolConfigBuilder::new()
        .health_check_interval(Duration::from_millis(20))
        .recovery_retry(RetryPolicy::immediate(1))
        .build()
        .unwrap();
    let pool = pool_with_config(&factory, config);

    let mut monitor = HealthMonitor::start(Arc::clone(&pool));

    let deadline = Instant::now() + Duration::from_secs(5);
    while !pool.is_ready() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(pool.is_ready(), "monitor should have initialized the pool");

    monitor.stop();
    assert!(!monitor.is_running());
}

/// stop_async returns promptly even with a long interval.
#[tokio::test]
async fn test_stop_async_wakes_thread() {
    let factory = MockBrowserFactory::new();
    let pool = pool_with_config(&factory, fast_config());
    let mut monitor = HealthMonitor::start(Arc::clone(&pool));

    let started = Instant::now();
    monitor.stop_async().await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!monitor.is_running());
    // Interval is 30s; no cycle ran
    assert_eq!(factory.launch_count(), 0);
}
