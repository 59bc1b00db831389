//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Caller → pool.rs (Pool::get_conn, pool-wide lock)
//!     → round_robin.rs (advance cursor one endpoint per scan step)
//!     → endpoint.rs (connection + health for that address)
//!         - eager: cached health flag decides
//!         - lazy:  transport readiness decides, dial on demand
//!     → ConnectionRef or NoHealthyConnections
//! ```
//!
//! # Design Decisions
//! - One registry/selector for both policies; the mode only changes how
//!   health is evaluated during the scan
//! - Cursor persists across calls and advances once per step, under the lock
//! - Unhealthy endpoints excluded from selection
//! - The pool owns every connection; callers only borrow

pub mod endpoint;
pub mod pool;
pub mod round_robin;

pub use endpoint::{Endpoint, EndpointStatus};
pub use pool::{ConnectionRef, Pool};
pub use round_robin::RoundRobin;
