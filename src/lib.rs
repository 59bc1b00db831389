//! Client-side connection pool and round-robin balancer for backend RPC
//! endpoints.
//!
//! A [`Pool`] keeps one connection per configured address, decides which
//! connections are usable, and hands out healthy ones in rotation. Two
//! policies are available through [`PoolMode`]:
//!
//! - **eager**: every address is dialed at construction (any failure is
//!   fatal) and a background prober refreshes health on a timer.
//! - **lazy**: nothing is dialed up front; `get_conn` checks transport
//!   readiness and dials on demand, skipping endpoints that cannot be reached.
//!
//! Transports plug in through [`Connector`] and [`Connection`]; an HTTP/1
//! transport on hyper ships in [`net::http`].

pub mod config;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::{PoolConfig, PoolMode};
pub use error::{CloseError, DialError, PoolError, TransportError};
pub use health::state::HealthState;
pub use lifecycle::Shutdown;
pub use load_balancer::{ConnectionRef, EndpointStatus, Pool};
pub use net::{Connection, Connector, HealthStatus, HttpConnection, HttpConnector};
