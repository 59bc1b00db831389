//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Dial to endpoint:
//!     → per-attempt timeout (net::dialer)
//!     → On failure: backoff.rs (delay before the next attempt)
//!     → After max_retries: DialError
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every dial and health check has a deadline
//! - Backoff is capped and local to one dial call; eager dials run concurrently
//! - Jittered backoff prevents thundering herd when many pools redial together

pub mod backoff;
