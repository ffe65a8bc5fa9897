//! Configuration for the browser lifecycle and health monitoring.
//!
//! This module provides [`PoolConfig`] and [`PoolConfigBuilder`]. Defaults
//! match what a single-node deployment needs: check every 30 seconds,
//! recycle a browser idle for an hour, give launch and conversion 30
//! seconds each.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use md2pdf_server::PoolConfigBuilder;
//!
//! let config = PoolConfigBuilder::new()
//!     .idle_ttl(Duration::from_secs(600))
//!     .health_check_interval(Duration::from_secs(10))
//!     .build()
//!     .expect("Invalid configuration");
//!
//! assert_eq!(config.idle_ttl.as_secs(), 600);
//! ```
//!
//! # Environment Configuration
//!
//! With the `env-config` feature, [`env::from_env`] reads an optional
//! `app.env` file and the `MD2PDF_*` environment variables.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Lifecycle configuration for the shared browser.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// How often the health monitor wakes up.
    ///
    /// Default: 30 seconds.
    pub health_check_interval: Duration,

    /// Idle time after which a ready browser is recycled.
    ///
    /// Long-lived Chrome processes accumulate memory; recycling an idle one
    /// costs nothing to callers. Default: 1 hour.
    pub idle_ttl: Duration,

    /// Hard limit on one launch plus smoke test.
    ///
    /// Default: 30 seconds.
    pub init_timeout: Duration,

    /// Overall deadline for a single conversion.
    ///
    /// Default: 30 seconds.
    pub conversion_timeout: Duration,

    /// Consecutive failed liveness pings before the monitor recycles the
    /// browser.
    ///
    /// Default: 3.
    pub max_ping_failures: u32,

    /// Attempts made at process start before serving without a browser.
    ///
    /// Default: 5 attempts, linear backoff in 1 second steps.
    pub startup_retry: RetryPolicy,

    /// Attempts made by the health monitor when the browser is missing.
    ///
    /// Default: 3 attempts, 2 seconds apart.
    pub recovery_retry: RetryPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            health_check_interval: Duration::from_secs(30),
            idle_ttl: Duration::from_secs(3600), // 1 hour
            init_timeout: Duration::from_secs(30),
            conversion_timeout: Duration::from_secs(30),
            max_ping_failures: 3,
            startup_retry: RetryPolicy::startup(),
            recovery_retry: RetryPolicy::recovery(),
        }
    }
}

/// Builder for [`PoolConfig`] with validation.
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// Start from [`PoolConfig::default`].
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
        }
    }

    /// Set the health monitor wake-up interval.
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.config.health_check_interval = interval;
        self
    }

    /// Set the idle recycling threshold.
    pub fn idle_ttl(mut self, ttl: Duration) -> Self {
        self.config.idle_ttl = ttl;
        self
    }

    /// Set the launch + smoke test time limit.
    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.config.init_timeout = timeout;
        self
    }

    /// Set the per-conversion deadline.
    pub fn conversion_timeout(mut self, timeout: Duration) -> Self {
        self.config.conversion_timeout = timeout;
        self
    }

    /// Set how many failed pings trigger a recycle.
    pub fn max_ping_failures(mut self, failures: u32) -> Self {
        self.config.max_ping_failures = failures;
        self
    }

    /// Set the startup retry policy.
    pub fn startup_retry(mut self, policy: RetryPolicy) -> Self {
        self.config.startup_retry = policy;
        self
    }

    /// Set the health monitor's recovery retry policy.
    pub fn recovery_retry(mut self, policy: RetryPolicy) -> Self {
        self.config.recovery_retry = policy;
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns a message if any interval or timeout is zero, or if
    /// `max_ping_failures` is zero.
    pub fn build(self) -> std::result::Result<PoolConfig, String> {
        let c = &self.config;

        if c.health_check_interval.is_zero() {
            return Err("health_check_interval must be greater than 0".to_string());
        }
        if c.idle_ttl.is_zero() {
            return Err("idle_ttl must be greater than 0".to_string());
        }
        if c.init_timeout.is_zero() {
            return Err("init_timeout must be greater than 0".to_string());
        }
        if c.conversion_timeout.is_zero() {
            return Err("conversion_timeout must be greater than 0".to_string());
        }
        if c.max_ping_failures == 0 {
            return Err("max_ping_failures must be greater than 0".to_string());
        }

        Ok(self.config)
    }
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Configuration (feature-gated)
// ============================================================================

/// Environment-based configuration loading.
///
/// | Variable | Type | Default |
/// |----------|------|---------|
/// | `MD2PDF_HEALTH_INTERVAL_SECONDS` | u64 | 30 |
/// | `MD2PDF_IDLE_TTL_SECONDS` | u64 | 3600 |
/// | `MD2PDF_INIT_TIMEOUT_SECONDS` | u64 | 30 |
/// | `MD2PDF_CONVERSION_TIMEOUT_SECONDS` | u64 | 30 |
/// | `MD2PDF_MAX_PING_FAILURES` | u32 | 3 |
/// | `MD2PDF_STARTUP_ATTEMPTS` | u32 | 5 |
/// | `CHROME_PATH` | String | auto-detect |
#[cfg(feature = "env-config")]
pub mod env {
    use super::*;
    use crate::error::PoolError;
    use crate::retry::RetryPolicy;

    /// Name of the optional env file read before the process environment.
    pub const ENV_FILE_NAME: &str = "app.env";

    /// Load [`ENV_FILE_NAME`] from the working directory.
    pub fn load_env_file() -> Result<std::path::PathBuf, dotenvy::Error> {
        dotenvy::from_filename(ENV_FILE_NAME)
    }

    fn var_or<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    /// Build a [`PoolConfig`] from the environment.
    ///
    /// Unset or unparsable variables fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Configuration`] if the resulting values fail
    /// validation (e.g. a zero interval).
    pub fn from_env() -> Result<PoolConfig, PoolError> {
        match load_env_file() {
            Ok(path) => {
                log::info!("✅ Loaded configuration from: {:?}", path);
            }
            Err(e) => {
                log::debug!(
                    "No {} file found or failed to load: {} (using environment variables and defaults)",
                    ENV_FILE_NAME,
                    e
                );
            }
        }

        let defaults = PoolConfig::default();

        let health_interval = var_or(
            "MD2PDF_HEALTH_INTERVAL_SECONDS",
            defaults.health_check_interval.as_secs(),
        );
        let idle_ttl = var_or("MD2PDF_IDLE_TTL_SECONDS", defaults.idle_ttl.as_secs());
        let init_timeout = var_or("MD2PDF_INIT_TIMEOUT_SECONDS", defaults.init_timeout.as_secs());
        let conversion_timeout = var_or(
            "MD2PDF_CONVERSION_TIMEOUT_SECONDS",
            defaults.conversion_timeout.as_secs(),
        );
        let max_ping_failures = var_or("MD2PDF_MAX_PING_FAILURES", defaults.max_ping_failures);
        let startup_attempts = var_or(
            "MD2PDF_STARTUP_ATTEMPTS",
            defaults.startup_retry.max_attempts,
        );

        log::info!("Loading pool configuration from environment:");
        log::info!("   - Health check interval: {}s", health_interval);
        log::info!("   - Idle TTL: {}s ({}min)", idle_ttl, idle_ttl / 60);
        log::info!("   - Init timeout: {}s", init_timeout);
        log::info!("   - Conversion timeout: {}s", conversion_timeout);
        log::info!("   - Max ping failures: {}", max_ping_failures);
        log::info!("   - Startup attempts: {}", startup_attempts);

        PoolConfigBuilder::new()
            .health_check_interval(Duration::from_secs(health_interval))
            .idle_ttl(Duration::from_secs(idle_ttl))
            .init_timeout(Duration::from_secs(init_timeout))
            .conversion_timeout(Duration::from_secs(conversion_timeout))
            .max_ping_failures(max_ping_failures)
            .startup_retry(RetryPolicy::new(
                startup_attempts,
                defaults.startup_retry.delay,
            ))
            .build()
            .map_err(PoolError::Configuration)
    }

    /// Custom Chrome binary path from `CHROME_PATH`, if set.
    pub fn chrome_path_from_env() -> Option<String> {
        std::env::var("CHROME_PATH").ok().filter(|p| !p.trim().is_empty())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::DelayStrategy;

    #[test]
    fn test_config_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.health_check_interval, Duration::from_secs(30));
        assert_eq!(config.idle_ttl, Duration::from_secs(3600));
        assert_eq!(config.init_timeout, Duration::from_secs(30));
        assert_eq!(config.conversion_timeout, Duration::from_secs(30));
        assert_eq!(config.max_ping_failures, 3);
        assert_eq!(config.startup_retry.max_attempts, 5);
        assert_eq!(
            config.startup_retry.delay,
            DelayStrategy::Linear(Duration::from_secs(1))
        );
        assert_eq!(config.recovery_retry.max_attempts, 3);
    }

    #[test]
    fn test_config_builder_chaining() {
        let config = PoolConfigBuilder::new()
            .health_check_interval(Duration::from_secs(5))
            .idle_ttl(Duration::from_secs(60))
            .init_timeout(Duration::from_secs(10))
            .conversion_timeout(Duration::from_secs(15))
            .max_ping_failures(5)
            .startup_retry(RetryPolicy::immediate(2))
            .recovery_retry(RetryPolicy::immediate(1))
            .build()
            .unwrap();

        assert_eq!(config.health_check_interval.as_secs(), 5);
        assert_eq!(config.idle_ttl.as_secs(), 60);
        assert_eq!(config.init_timeout.as_secs(), 10);
        assert_eq!(config.conversion_timeout.as_secs(), 15);
        assert_eq!(config.max_ping_failures, 5);
        assert_eq!(config.startup_retry, RetryPolicy::immediate(2));
        assert_eq!(config.recovery_retry.max_attempts, 1);
    }

    #[test]
    fn test_config_validation() {
        let err = PoolConfigBuilder::new()
            .idle_ttl(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.contains("idle_ttl"), "unexpected message: {}", err);

        let err = PoolConfigBuilder::new()
            .health_check_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.contains("health_check_interval"));

        let err = PoolConfigBuilder::new()
            .conversion_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.contains("conversion_timeout"));

        let err = PoolConfigBuilder::new()
            .max_ping_failures(0)
            .build()
            .unwrap_err();
        assert!(err.contains("max_ping_failures"));
    }

    #[test]
    fn test_builder_default() {
        let builder: PoolConfigBuilder = Default::default();
        let config = builder.build().unwrap();
        assert_eq!(config.idle_ttl, Duration::from_secs(3600));
    }
}
