//! Transport abstraction.
//!
//! # Responsibilities
//! - Define what the pool needs from a connection (readiness, health, close)
//! - Define how connections are created (`Connector`)
//!
//! The pool never looks inside a connection; any transport that can report
//! readiness and answer a serving/not-serving health query can be pooled.

use std::future::Future;
use crate::error::TransportError;

/// Result of a health query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// The backend reports it is serving requests.
    Serving,
    /// The backend answered but is not serving.
    NotServing,
    /// The backend answered without a usable status.
    Unknown,
}

impl HealthStatus {
    pub fn is_serving(self) -> bool {
        self == HealthStatus::Serving
    }
}

/// A live connection to one backend.
pub trait Connection: Send + Sync + 'static {
    /// Whether the underlying channel is established and usable for requests.
    /// Must not block or perform I/O.
    fn is_ready(&self) -> bool;

    /// Issue a single health query. The caller applies the timeout.
    fn check_health(&self) -> impl Future<Output = Result<HealthStatus, TransportError>> + Send;

    /// Release the transport. Later calls on the connection fail with
    /// [`TransportError::Closed`].
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Creates connections to backend addresses.
///
/// Transport specific options (credentials, socket settings) live on the
/// connector value itself.
pub trait Connector: Send + Sync + 'static {
    type Conn: Connection;

    /// Open a connection to `address`. The caller applies the timeout.
    fn connect(&self, address: &str) -> impl Future<Output = Result<Self::Conn, TransportError>> + Send;
}
