//! Coordination configuration.
//!
//! Configuration for the revocation cache and the distributed lock.
//! Defaults mirror the constants the fleet runs with in production; all
//! of them are overridable per deployment.
//!
//! # Example (TOML)
//!
//! ```toml
//! [revocation]
//! grace_period = "60s"
//! local_cache_capacity = 10000
//! local_cache_ttl = "10m"
//!
//! [lock]
//! default_wait_budget = "30s"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root coordination configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CoordConfig {
    /// Revocation cache configuration.
    pub revocation: RevocationConfig,

    /// Distributed lock configuration.
    pub lock: LockConfig,
}

/// Revocation cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RevocationConfig {
    /// Extra lifetime added to every revocation record beyond the
    /// credential's own expiry. Compensates for clock skew and claim
    /// precision loss between services.
    #[serde(with = "humantime_serde")]
    pub grace_period: Duration,

    /// Maximum number of entries in the process-local positive cache.
    pub local_cache_capacity: usize,

    /// How long a local positive entry is trusted before the store is
    /// asked again. Deliberately much shorter than typical remote TTLs:
    /// this window bounds cross-instance staleness.
    #[serde(with = "humantime_serde")]
    pub local_cache_ttl: Duration,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(60),
            local_cache_capacity: 10_000,
            local_cache_ttl: Duration::from_secs(600), // 10 minutes
        }
    }
}

/// Distributed lock configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LockConfig {
    /// How long `with_exclusive_lock` waits for a contested lease before
    /// failing with a lock timeout.
    #[serde(with = "humantime_serde")]
    pub default_wait_budget: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_wait_budget: Duration::from_secs(30),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl CoordConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The local cache capacity is zero
    /// - The local cache TTL is zero
    /// - The lock wait budget is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.revocation.local_cache_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "revocation.local_cache_capacity must be > 0".to_string(),
            ));
        }

        if self.revocation.local_cache_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "revocation.local_cache_ttl must be > 0".to_string(),
            ));
        }

        if self.lock.default_wait_budget.is_zero() {
            return Err(ConfigError::InvalidValue(
                "lock.default_wait_budget must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
