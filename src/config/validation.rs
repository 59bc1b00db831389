//! Configuration validation.
//!
//! Serde handles syntax; this checks values. Every problem is reported, not
//! just the first one.

use crate::config::schema::{PoolConfig, PoolMode};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NoAddresses,
    /// Address is empty or only whitespace.
    BlankAddress(usize),
    ZeroRetries,
    ZeroDialTimeout,
    ZeroHealthTimeout,
    ZeroCheckInterval,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NoAddresses => write!(f, "at least one address is required"),
            ValidationError::BlankAddress(index) => write!(f, "addresses[{}] is blank", index),
            ValidationError::ZeroRetries => write!(f, "dial.max_retries must be at least 1"),
            ValidationError::ZeroDialTimeout => write!(f, "dial.timeout_ms must be greater than 0"),
            ValidationError::ZeroHealthTimeout => {
                write!(f, "health_check.timeout_ms must be greater than 0")
            }
            ValidationError::ZeroCheckInterval => {
                write!(f, "health_check.interval_ms must be greater than 0 in eager mode")
            }
        }
    }
}

/// Validate a pool configuration.
pub fn validate_config(config: &PoolConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.addresses.is_empty() {
        errors.push(ValidationError::NoAddresses);
    }
    // Address syntax belongs to the connector; only blank entries are caught here.
    for (index, addr) in config.addresses.iter().enumerate() {
        if addr.trim().is_empty() {
            errors.push(ValidationError::BlankAddress(index));
        }
    }

    if config.dial.max_retries == 0 {
        errors.push(ValidationError::ZeroRetries);
    }
    if config.dial.timeout_ms == 0 {
        errors.push(ValidationError::ZeroDialTimeout);
    }
    if config.health_check.timeout_ms == 0 {
        errors.push(ValidationError::ZeroHealthTimeout);
    }
    if config.mode == PoolMode::Eager && config.health_check.interval_ms == 0 {
        errors.push(ValidationError::ZeroCheckInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
