//! Connection pool facade.
//!
//! # Responsibilities
//! - Build the endpoint registry from a validated `PoolConfig`
//! - Hand out connections by round-robin under one pool-wide lock
//! - Dial on demand (lazy) or dial up front and probe in the background (eager)
//! - Retire every connection exactly once on close
//!
//! # Contention
//! In lazy mode a dial runs while the pool lock is held, so redialing an
//! unresponsive endpoint stalls concurrent `get_conn` calls for up to
//! `max_retries` dial timeouts (plus backoff). Eager mode never does I/O
//! under the lock.

use std::ops::Deref;
use std::sync::Arc;
use futures_util::future::join_all;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::config::{validate_config, ConfigError, PoolConfig, PoolMode};
use crate::error::{CloseError, PoolError, PoolResult};
use crate::health::active::{log_transition, HealthMonitor};
use crate::health::state::HealthState;
use crate::lifecycle::Shutdown;
use crate::load_balancer::endpoint::{Endpoint, EndpointStatus};
use crate::load_balancer::round_robin::RoundRobin;
use crate::net::connection::{Connection, Connector};
use crate::net::dialer::Dialer;
use crate::observability::metrics;

/// A connection borrowed from the pool.
///
/// The pool keeps ownership: do not close the connection through this
/// reference, use [`Pool::close`].
#[derive(Debug)]
pub struct ConnectionRef<T> {
    conn: Arc<T>,
    address: String,
    index: usize,
}

impl<T> ConnectionRef<T> {
    /// Address of the endpoint the connection belongs to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Position of the endpoint in the configured address list.
    pub fn endpoint_index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for ConnectionRef<T> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            address: self.address.clone(),
            index: self.index,
        }
    }
}

impl<T> Deref for ConnectionRef<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.conn
    }
}

/// State guarded by the pool lock.
#[derive(Debug)]
pub(crate) struct Registry<T> {
    pub(crate) endpoints: Vec<Endpoint<T>>,
    pub(crate) selector: RoundRobin,
    pub(crate) closed: bool,
}

/// Everything the pool shares with its background prober.
pub(crate) struct Shared<C: Connector> {
    pub(crate) config: PoolConfig,
    pub(crate) dialer: Dialer<C>,
    pub(crate) registry: Mutex<Registry<C::Conn>>,
}

/// Round-robin connection pool over a fixed set of endpoints.
pub struct Pool<C: Connector> {
    shared: Arc<Shared<C>>,
    shutdown: Shutdown,
    prober: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<C: Connector> Pool<C> {
    /// Build a pool.
    ///
    /// In eager mode every address is dialed now and any dial failure aborts
    /// construction. In lazy mode nothing is dialed.
    pub async fn new(config: PoolConfig, connector: C) -> PoolResult<Self> {
        Self::build(config, connector, None).await
    }

    /// Build a pool whose background prober also stops when `signal` fires
    /// (or its sender is dropped).
    pub async fn with_shutdown(
        config: PoolConfig,
        connector: C,
        signal: broadcast::Receiver<()>,
    ) -> PoolResult<Self> {
        Self::build(config, connector, Some(signal)).await
    }

    async fn build(
        config: PoolConfig,
        connector: C,
        external: Option<broadcast::Receiver<()>>,
    ) -> PoolResult<Self> {
        validate_config(&config).map_err(|errors| PoolError::Config(ConfigError::Validation(errors)))?;

        let dialer = Dialer::new(connector, &config.dial);
        let mut endpoints: Vec<Endpoint<C::Conn>> =
            config.addresses.iter().map(Endpoint::new).collect();

        if config.mode == PoolMode::Eager {
            let results = join_all(config.addresses.iter().map(|addr| dialer.dial(addr))).await;

            let mut first_error = None;
            let mut dialed = Vec::with_capacity(results.len());
            for result in results {
                match result {
                    Ok(conn) => dialed.push(Some(conn)),
                    Err(e) => {
                        first_error.get_or_insert(e);
                        dialed.push(None);
                    }
                }
            }

            if let Some(err) = first_error {
                tracing::error!(address = %err.address, error = %err, "Eager dial failed, aborting pool construction");
                for conn in dialed.into_iter().flatten() {
                    if let Err(e) = conn.close().await {
                        tracing::debug!(error = %e, "Failed to close connection after aborted construction");
                    }
                }
                return Err(err.into());
            }

            for (endpoint, conn) in endpoints.iter_mut().zip(dialed.into_iter().flatten()) {
                endpoint.attach(Arc::new(conn));
                metrics::record_endpoint_health(endpoint.address(), true);
            }
        }

        let mode = config.mode;
        let shared = Arc::new(Shared {
            config,
            dialer,
            registry: Mutex::new(Registry {
                endpoints,
                selector: RoundRobin::new(),
                closed: false,
            }),
        });

        let shutdown = Shutdown::new();
        let prober = match mode {
            PoolMode::Eager => {
                let monitor = HealthMonitor::new(Arc::clone(&shared));
                Some(tokio::spawn(monitor.run(shutdown.subscribe(), external)))
            }
            PoolMode::Lazy => None,
        };

        tracing::info!(
            mode = %mode,
            endpoints = shared.config.addresses.len(),
            "Connection pool ready"
        );

        Ok(Self {
            shared,
            shutdown,
            prober: std::sync::Mutex::new(prober),
        })
    }

    /// Acquire a usable connection, rotating over endpoints.
    pub async fn get_conn(&self) -> PoolResult<ConnectionRef<C::Conn>> {
        let result = match self.shared.config.mode {
            PoolMode::Eager => self.select_cached().await,
            PoolMode::Lazy => self.select_or_dial().await,
        };
        metrics::record_acquire(if result.is_ok() { "ok" } else { "no_healthy" });
        result
    }

    /// Eager selection: trust the health flags maintained by the prober.
    async fn select_cached(&self) -> PoolResult<ConnectionRef<C::Conn>> {
        let mut guard = self.shared.registry.lock().await;
        if guard.closed {
            tracing::debug!("get_conn on closed pool");
            return Err(PoolError::NoHealthyConnections);
        }

        let registry = &mut *guard;
        let Some(index) = registry.selector.select(&registry.endpoints) else {
            tracing::debug!(endpoint_count = registry.endpoints.len(), "No healthy endpoints found");
            for ep in &registry.endpoints {
                tracing::debug!(address = %ep.address(), health = %ep.health(), "Endpoint status");
            }
            return Err(PoolError::NoHealthyConnections);
        };

        let endpoint = &registry.endpoints[index];
        let conn = endpoint
            .connection()
            .cloned()
            .ok_or(PoolError::NoHealthyConnections)?;
        Ok(ConnectionRef {
            conn,
            address: endpoint.address().to_string(),
            index,
        })
    }

    /// Lazy selection: reuse a ready connection or (re)dial, one endpoint per turn.
    async fn select_or_dial(&self) -> PoolResult<ConnectionRef<C::Conn>> {
        let mut registry = self.shared.registry.lock().await;
        if registry.closed {
            tracing::debug!("get_conn on closed pool");
            return Err(PoolError::NoHealthyConnections);
        }

        let len = registry.endpoints.len();
        for _ in 0..len {
            let index = registry.selector.next_index(len);
            let endpoint = &mut registry.endpoints[index];
            let address = endpoint.address().to_string();

            if let Some(conn) = endpoint.connection().filter(|c| c.is_ready()).cloned() {
                endpoint.record(HealthState::Healthy);
                return Ok(ConnectionRef { conn, address, index });
            }

            if let Some(stale) = endpoint.detach() {
                tracing::debug!(address = %address, "Retiring connection that is no longer ready");
                if let Err(e) = stale.close().await {
                    tracing::debug!(address = %address, error = %e, "Failed to close stale connection");
                }
            }

            match self.shared.dialer.dial(&address).await {
                Ok(conn) => {
                    let conn = Arc::new(conn);
                    let endpoint = &mut registry.endpoints[index];
                    let previous = endpoint.health();
                    endpoint.attach(Arc::clone(&conn));
                    log_transition(&address, previous, HealthState::Healthy);
                    metrics::record_endpoint_health(&address, true);
                    return Ok(ConnectionRef { conn, address, index });
                }
                Err(e) => {
                    tracing::warn!(address = %address, error = %e, "Endpoint unavailable, trying next");
                    registry.endpoints[index].record(HealthState::Unhealthy);
                    metrics::record_endpoint_health(&address, false);
                }
            }
        }

        tracing::debug!(endpoint_count = len, "No endpoint could supply a connection");
        Err(PoolError::NoHealthyConnections)
    }

    /// Close every connection and stop the prober. Calling it again is a no-op.
    ///
    /// Every close failure is collected; one failing connection does not stop
    /// the others from being closed.
    pub async fn close(&self) -> Result<(), CloseError> {
        let connections: Vec<(String, Arc<C::Conn>)> = {
            let mut registry = self.shared.registry.lock().await;
            if registry.closed {
                return Ok(());
            }
            registry.closed = true;
            registry
                .endpoints
                .iter_mut()
                .filter_map(|ep| ep.detach().map(|conn| (ep.address().to_string(), conn)))
                .collect()
        };

        self.shutdown.trigger();
        let prober = self.take_prober();
        if let Some(handle) = prober {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "Health monitor panicked");
                }
            }
        }

        let mut failures = Vec::new();
        for (address, conn) in connections {
            match conn.close().await {
                Ok(()) => tracing::debug!(address = %address, "Connection closed"),
                Err(e) => {
                    tracing::warn!(address = %address, error = %e, "Failed to close connection");
                    failures.push((address, e));
                }
            }
        }

        tracing::info!(failures = failures.len(), "Connection pool closed");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CloseError { failures })
        }
    }

    fn take_prober(&self) -> Option<JoinHandle<()>> {
        match self.prober.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Point-in-time state of every endpoint, in address order.
    pub async fn snapshot(&self) -> Vec<EndpointStatus> {
        let registry = self.shared.registry.lock().await;
        registry.endpoints.iter().map(Endpoint::status).collect()
    }

    /// Number of configured endpoints. Never zero: construction rejects an
    /// empty address list.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.shared.config.addresses.len()
    }

    /// Acquisition policy the pool was built with.
    pub fn mode(&self) -> PoolMode {
        self.shared.config.mode
    }

    /// The validated configuration the pool was built from.
    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Whether [`Pool::close`] has run. A closed pool hands out nothing.
    pub async fn is_closed(&self) -> bool {
        self.shared.registry.lock().await.closed
    }
}

impl<C: Connector> Drop for Pool<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.take_prober() {
            handle.abort();
        }
    }
}

impl<C: Connector> std::fmt::Debug for Pool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("mode", &self.shared.config.mode)
            .field("addresses", &self.shared.config.addresses)
            .finish()
    }
}
