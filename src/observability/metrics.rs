//! Metrics collection.
//!
//! # Metrics
//! - `rpc_pool_endpoint_health` (gauge): 1=healthy, 0=unhealthy, per address
//! - `rpc_pool_dial_attempts_total` (counter): dial attempts by address, outcome
//! - `rpc_pool_acquire_total` (counter): `get_conn` results by outcome
//!
//! Recording goes through the `metrics` facade; without an installed
//! recorder every call is a no-op.

use metrics::{counter, gauge};

/// Record the health flag of one endpoint.
pub fn record_endpoint_health(address: &str, healthy: bool) {
    gauge!("rpc_pool_endpoint_health", "address" => address.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

/// Record the outcome of one dial attempt ("ok", "error", "timeout", "not_ready").
pub fn record_dial_attempt(address: &str, outcome: &'static str) {
    counter!("rpc_pool_dial_attempts_total", "address" => address.to_string(), "outcome" => outcome)
        .increment(1);
}

/// Record the outcome of one acquisition ("ok" or "no_healthy").
pub fn record_acquire(outcome: &'static str) {
    counter!("rpc_pool_acquire_total", "outcome" => outcome).increment(1);
}
