//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every endpoint of an eager pool
//! - Update endpoint health from the results
//! - Redial endpoints whose transport has gone away
//!
//! Probes run concurrently and each result is written on its own, so a hung
//! endpoint only delays itself. The pool lock is never held across I/O.

use std::sync::Arc;
use std::time::Duration;
use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::health::state::HealthState;
use crate::load_balancer::pool::Shared;
use crate::net::connection::{Connection, Connector};
use crate::observability::metrics;

/// What one sweep needs to know about an endpoint, copied out under the lock.
struct ProbeTarget<T> {
    index: usize,
    address: String,
    connection: Option<Arc<T>>,
    generation: u64,
}

pub struct HealthMonitor<C: Connector> {
    shared: Arc<Shared<C>>,
    interval: Duration,
    timeout: Duration,
    reconnect: bool,
}

impl<C: Connector> HealthMonitor<C> {
    pub(crate) fn new(shared: Arc<Shared<C>>) -> Self {
        let health = &shared.config.health_check;
        let interval = health.interval();
        let timeout = health.timeout();
        let reconnect = health.reconnect;
        Self {
            shared,
            interval,
            timeout,
            reconnect,
        }
    }

    /// Probe on every tick until `shutdown` or `external` fires.
    pub async fn run(
        self,
        mut shutdown: broadcast::Receiver<()>,
        mut external: Option<broadcast::Receiver<()>>,
    ) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            timeout_ms = self.timeout.as_millis() as u64,
            reconnect = self.reconnect,
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; endpoints were just dialed.
        ticker.tick().await;

        loop {
            let ticked = tokio::select! {
                _ = ticker.tick() => true,
                _ = cancelled(&mut shutdown, &mut external) => false,
            };
            if !ticked {
                break;
            }

            let swept = tokio::select! {
                _ = self.check_all() => true,
                _ = cancelled(&mut shutdown, &mut external) => false,
            };
            if !swept {
                break;
            }
        }

        tracing::info!("Health monitor received shutdown signal, exiting loop");
    }

    async fn check_all(&self) {
        let targets: Vec<ProbeTarget<C::Conn>> = {
            let registry = self.shared.registry.lock().await;
            if registry.closed {
                return;
            }
            registry
                .endpoints
                .iter()
                .enumerate()
                .map(|(index, ep)| ProbeTarget {
                    index,
                    address: ep.address().to_string(),
                    connection: ep.connection().cloned(),
                    generation: ep.generation(),
                })
                .collect()
        };

        join_all(targets.into_iter().map(|target| self.check_endpoint(target))).await;
    }

    async fn check_endpoint(&self, target: ProbeTarget<C::Conn>) {
        let ready = target.connection.as_ref().filter(|c| c.is_ready()).cloned();

        match ready {
            Some(conn) => {
                let healthy = self.probe(&target.address, conn.as_ref()).await;
                self.apply(&target, HealthState::from_probe(healthy)).await;
            }
            None if self.reconnect => self.redial(&target).await,
            None => {
                tracing::warn!(address = %target.address, "Health check skipped: connection not ready");
                self.apply(&target, HealthState::Unhealthy).await;
            }
        }
    }

    async fn probe(&self, address: &str, conn: &C::Conn) -> bool {
        match time::timeout(self.timeout, conn.check_health()).await {
            Ok(Ok(status)) => {
                if !status.is_serving() {
                    tracing::warn!(address = %address, status = ?status, "Health check failed: not serving");
                }
                status.is_serving()
            }
            Ok(Err(e)) => {
                tracing::warn!(address = %address, error = %e, "Health check failed: transport error");
                false
            }
            Err(_) => {
                tracing::warn!(address = %address, timeout = ?self.timeout, "Health check failed: timeout");
                false
            }
        }
    }

    /// Write one probe result, unless the pool closed or the endpoint got a
    /// new connection while the probe was in flight.
    async fn apply(&self, target: &ProbeTarget<C::Conn>, health: HealthState) {
        let mut registry = self.shared.registry.lock().await;
        if registry.closed {
            return;
        }
        let endpoint = &mut registry.endpoints[target.index];
        if endpoint.generation() != target.generation {
            tracing::debug!(address = %target.address, "Discarding result for replaced connection");
            return;
        }

        let previous = endpoint.health();
        endpoint.record(health);
        let current = endpoint.health();
        tracing::debug!(address = %target.address, health = %current, "Health check complete");
        log_transition(&target.address, previous, current);
        metrics::record_endpoint_health(&target.address, current.is_healthy());
    }

    /// Retire a dead connection and dial a replacement outside the lock.
    async fn redial(&self, target: &ProbeTarget<C::Conn>) {
        let retired = {
            let mut registry = self.shared.registry.lock().await;
            if registry.closed {
                return;
            }
            let endpoint = &mut registry.endpoints[target.index];
            if endpoint.generation() != target.generation {
                return;
            }
            let previous = endpoint.health();
            let retired = endpoint.detach();
            endpoint.record(HealthState::Unhealthy);
            log_transition(&target.address, previous, HealthState::Unhealthy);
            metrics::record_endpoint_health(&target.address, false);
            retired
        };

        if let Some(conn) = retired {
            if let Err(e) = conn.close().await {
                tracing::debug!(address = %target.address, error = %e, "Failed to close dead connection");
            }
        }

        let conn = match self.shared.dialer.dial(&target.address).await {
            Ok(conn) => Arc::new(conn),
            Err(e) => {
                tracing::warn!(address = %target.address, error = %e, "Reconnect failed");
                return;
            }
        };

        let mut registry = self.shared.registry.lock().await;
        let stale = registry.closed || {
            let endpoint = &registry.endpoints[target.index];
            endpoint.generation() != target.generation || endpoint.connection().is_some()
        };
        if stale {
            drop(registry);
            if let Err(e) = conn.close().await {
                tracing::debug!(address = %target.address, error = %e, "Failed to close unused connection");
            }
            return;
        }

        registry.endpoints[target.index].attach(conn);
        log_transition(&target.address, HealthState::Unhealthy, HealthState::Healthy);
        metrics::record_endpoint_health(&target.address, true);
    }
}

/// Resolves once either shutdown channel fires or loses its sender.
async fn cancelled(
    internal: &mut broadcast::Receiver<()>,
    external: &mut Option<broadcast::Receiver<()>>,
) {
    match external {
        Some(rx) => {
            tokio::select! {
                _ = internal.recv() => {}
                _ = rx.recv() => {}
            }
        }
        None => {
            let _ = internal.recv().await;
        }
    }
}

/// Log a health change for one endpoint. Same-state updates are silent.
pub(crate) fn log_transition(address: &str, previous: HealthState, current: HealthState) {
    if previous == current {
        return;
    }
    match current {
        HealthState::Healthy => {
            tracing::info!(address = %address, from = %previous, "Endpoint became healthy");
        }
        _ => {
            tracing::warn!(address = %address, from = %previous, to = %current, "Endpoint became unhealthy");
        }
    }
}
