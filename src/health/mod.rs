//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Eager pools (active.rs):
//!     Periodic timer
//!     → Probe each endpoint concurrently (bounded by health timeout)
//!     → Update state.rs flags under the pool lock
//!     → Dead transports are retired and redialed
//!
//! Lazy pools:
//!     get_conn checks transport readiness synchronously
//!     → Not ready: retire and redial in place
//! ```
//!
//! # Design Decisions
//! - Only an explicit Serving answer before the deadline counts as healthy
//! - Health state is per-endpoint, written by one endpoint's probe at a time
//! - Results for a replaced connection are discarded (generation check)

pub mod active;
pub mod state;
