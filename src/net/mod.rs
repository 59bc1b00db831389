//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Pool needs a connection for an endpoint
//!     → dialer.rs (retries, per-attempt timeout, readiness check)
//!     → connection.rs (Connector::connect, transport agnostic)
//!     → http.rs (bundled hyper HTTP/1 transport)
//!     → Connection handed to the endpoint registry
//! ```
//!
//! # Design Decisions
//! - The pool only sees the `Connector`/`Connection` traits
//! - Timeouts are applied by the dialer and prober, not by transports
//! - Transport options travel on the connector, opaque to the pool

pub mod connection;
pub mod dialer;
pub mod http;

pub use connection::{Connection, Connector, HealthStatus};
pub use dialer::Dialer;
pub use http::{HttpConnection, HttpConnector};
