//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Pool construction:
//!     Validate config → Dial (eager) → Spawn prober (eager)
//!
//! Shutdown (shutdown.rs):
//!     Pool::close or external signal → Prober stops → Connections closed
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → CLI triggers its Shutdown → pool closed
//! ```
//!
//! # Design Decisions
//! - Background tasks subscribe to a broadcast channel; dropping the sender
//!   also stops them
//! - Close waits for the prober to exit before closing connections

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
