//! Endpoint registry.
//!
//! # Responsibilities
//! - Represent a single configured backend address
//! - Own the connection handle for that address
//! - Track health state and when it was last checked
//!
//! Nothing here performs I/O. All mutation happens under the pool lock.

use std::sync::Arc;
use std::time::{Duration, Instant};
use serde::Serialize;

use crate::health::state::HealthState;

/// A single configured backend.
#[derive(Debug)]
pub struct Endpoint<T> {
    address: String,
    connection: Option<Arc<T>>,
    health: HealthState,
    last_checked: Option<Instant>,
    /// Bumped whenever a connection is attached, so results computed
    /// against a retired connection can be recognised and dropped.
    generation: u64,
}

impl<T> Endpoint<T> {
    /// Create an endpoint with no connection.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connection: None,
            health: HealthState::Unhealthy,
            last_checked: None,
            generation: 0,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn connection(&self) -> Option<&Arc<T>> {
        self.connection.as_ref()
    }

    pub fn health(&self) -> HealthState {
        self.health
    }

    pub fn is_healthy(&self) -> bool {
        self.health.is_healthy()
    }

    pub fn last_checked(&self) -> Option<Instant> {
        self.last_checked
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Install a freshly dialed connection and mark the endpoint healthy.
    /// Returns the connection it replaced, if any, for the caller to close.
    pub fn attach(&mut self, conn: Arc<T>) -> Option<Arc<T>> {
        let previous = self.connection.replace(conn);
        self.generation += 1;
        self.health = HealthState::Healthy;
        self.last_checked = Some(Instant::now());
        previous
    }

    /// Remove the connection and mark the endpoint unhealthy.
    pub fn detach(&mut self) -> Option<Arc<T>> {
        self.health = HealthState::Unhealthy;
        self.connection.take()
    }

    /// Record the result of a health evaluation. Without a connection the
    /// endpoint stays unhealthy whatever the result.
    pub fn record(&mut self, health: HealthState) {
        self.health = if self.connection.is_some() {
            health
        } else {
            HealthState::Unhealthy
        };
        self.last_checked = Some(Instant::now());
    }

    pub fn status(&self) -> EndpointStatus {
        EndpointStatus {
            address: self.address.clone(),
            health: self.health,
            connected: self.connection.is_some(),
            last_checked_ms_ago: self
                .last_checked
                .map(|at| duration_millis(at.elapsed())),
        }
    }
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Point-in-time view of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointStatus {
    pub address: String,
    pub health: HealthState,
    pub connected: bool,
    pub last_checked_ms_ago: Option<u64>,
}
