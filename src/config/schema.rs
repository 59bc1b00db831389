//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a pool.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Acquisition policy of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PoolMode {
    /// Dial every endpoint at construction, refresh health in the background.
    Eager,
    /// Dial on first use, check transport readiness at acquisition time.
    #[default]
    Lazy,
}

impl std::fmt::Display for PoolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolMode::Eager => write!(f, "eager"),
            PoolMode::Lazy => write!(f, "lazy"),
        }
    }
}

impl std::str::FromStr for PoolMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eager" => Ok(PoolMode::Eager),
            "lazy" => Ok(PoolMode::Lazy),
            other => Err(format!("unknown pool mode '{}', expected 'eager' or 'lazy'", other)),
        }
    }
}

/// Root configuration for a connection pool.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PoolConfig {
    /// Acquisition policy.
    pub mode: PoolMode,

    /// Backend addresses in rotation order. Opaque to the pool; the connector
    /// decides what a valid address is.
    pub addresses: Vec<String>,

    /// Dial settings.
    pub dial: DialConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Options handed to the transport verbatim.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl PoolConfig {
    /// Build a config for the given addresses with every other setting defaulted.
    pub fn with_addresses<I, S>(mode: PoolMode, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode,
            addresses: addresses.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Dial configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DialConfig {
    /// Timeout for a single dial attempt in milliseconds.
    pub timeout_ms: u64,

    /// Number of attempts per dial (at least 1).
    pub max_retries: u32,

    /// Base delay between attempts in milliseconds. 0 disables backoff.
    pub backoff_base_ms: u64,

    /// Upper bound for the delay between attempts in milliseconds.
    pub backoff_max_ms: u64,
}

impl DialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_retries: 3,
            backoff_base_ms: 0,
            backoff_max_ms: 1_000,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Health check timeout in milliseconds.
    pub timeout_ms: u64,

    /// Health check interval in milliseconds (eager mode).
    pub interval_ms: u64,

    /// Redial endpoints whose transport has gone away.
    pub reconnect: bool,
}

impl HealthCheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            interval_ms: 10_000,
            reconnect: true,
        }
    }
}

/// Transport options. The pool passes these through without reading them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Path to probe for HTTP health checks.
    pub health_path: String,

    /// User agent sent with health checks.
    pub user_agent: String,

    /// Set TCP_NODELAY on dialed sockets.
    pub nodelay: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            health_path: "/health".to_string(),
            user_agent: "rpc-pool-health-check".to_string(),
            nodelay: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
