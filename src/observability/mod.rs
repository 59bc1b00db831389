//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pool, dialer and prober produce:
//!     → tracing events (logging.rs installs the subscriber)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Whatever metrics recorder the embedding process installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (address, attempt, health) on every event
//! - Health transitions logged at info/warn, individual probes at debug
//! - The library never installs global state; binaries do

pub mod logging;
pub mod metrics;
