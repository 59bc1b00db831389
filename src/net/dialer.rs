//! Dialing with bounded retries.
//!
//! # Responsibilities
//! - Open a connection to one address through a `Connector`
//! - Apply the per-attempt timeout and require a ready transport
//! - Retry up to `max_retries` times with optional capped backoff

use std::time::Duration;
use tokio::time;

use crate::config::DialConfig;
use crate::error::{DialError, TransportError};
use crate::net::connection::{Connection, Connector};
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;

/// Dials addresses on behalf of a pool.
#[derive(Debug)]
pub struct Dialer<C> {
    connector: C,
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl<C: Connector> Dialer<C> {
    pub fn new(connector: C, config: &DialConfig) -> Self {
        Self {
            connector,
            timeout: config.timeout(),
            max_retries: config.max_retries.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Dial `address`, returning the first connection that comes up ready.
    pub async fn dial(&self, address: &str) -> Result<C::Conn, DialError> {
        let mut last_error = TransportError::NotReady;

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                let delay = calculate_backoff(attempt - 1, self.backoff_base, self.backoff_max);
                if !delay.is_zero() {
                    time::sleep(delay).await;
                }
            }

            tracing::debug!(address = %address, attempt, max_retries = self.max_retries, "Dialing endpoint");

            match time::timeout(self.timeout, self.connector.connect(address)).await {
                Ok(Ok(conn)) if conn.is_ready() => {
                    metrics::record_dial_attempt(address, "ok");
                    tracing::debug!(address = %address, attempt, "Endpoint dialed");
                    return Ok(conn);
                }
                Ok(Ok(conn)) => {
                    metrics::record_dial_attempt(address, "not_ready");
                    tracing::debug!(address = %address, attempt, "Dialed connection not ready, discarding");
                    if let Err(e) = conn.close().await {
                        tracing::debug!(address = %address, error = %e, "Failed to close unready connection");
                    }
                    last_error = TransportError::NotReady;
                }
                Ok(Err(e)) => {
                    metrics::record_dial_attempt(address, "error");
                    tracing::debug!(address = %address, attempt, error = %e, "Dial attempt failed");
                    last_error = e;
                }
                Err(_) => {
                    metrics::record_dial_attempt(address, "timeout");
                    tracing::debug!(address = %address, attempt, timeout = ?self.timeout, "Dial attempt timed out");
                    last_error = TransportError::Timeout(self.timeout);
                }
            }
        }

        Err(DialError {
            address: address.to_string(),
            attempts: self.max_retries,
            source: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;
    use crate::net::connection::HealthStatus;

    #[derive(Debug)]
    struct StubConn {
        ready: bool,
        closed: Arc<AtomicU32>,
    }

    impl Connection for StubConn {
        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn check_health(&self) -> Result<HealthStatus, TransportError> {
            Ok(HealthStatus::Serving)
        }

        async fn close(&self) -> Result<(), TransportError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails the first `failures` attempts, then succeeds.
    struct FlakyConnector {
        failures: u32,
        attempts: Arc<AtomicU32>,
        closed: Arc<AtomicU32>,
        unready_failures: bool,
        hang: AtomicBool,
    }

    impl FlakyConnector {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                attempts: Arc::new(AtomicU32::new(0)),
                closed: Arc::new(AtomicU32::new(0)),
                unready_failures: false,
                hang: AtomicBool::new(false),
            }
        }
    }

    impl Connector for FlakyConnector {
        type Conn = StubConn;

        async fn connect(&self, _address: &str) -> Result<StubConn, TransportError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if self.hang.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if n <= self.failures {
                if self.unready_failures {
                    return Ok(StubConn { ready: false, closed: self.closed.clone() });
                }
                return Err(TransportError::Io(std::io::ErrorKind::ConnectionRefused.into()));
            }
            Ok(StubConn { ready: true, closed: self.closed.clone() })
        }
    }

    fn config(max_retries: u32) -> DialConfig {
        DialConfig {
            timeout_ms: 100,
            max_retries,
            ..DialConfig::default()
        }
    }

    #[tokio::test]
    async fn succeeds_on_last_attempt() {
        let connector = FlakyConnector::new(2);
        let attempts = connector.attempts.clone();
        let dialer = Dialer::new(connector, &config(3));

        let conn = dialer.dial("a:1").await.unwrap();
        assert!(conn.is_ready());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let connector = FlakyConnector::new(u32::MAX);
        let attempts = connector.attempts.clone();
        let dialer = Dialer::new(connector, &config(3));

        let err = dialer.dial("b:2").await.unwrap_err();
        assert_eq!(err.address, "b:2");
        assert_eq!(err.attempts, 3);
        assert!(matches!(err.source, TransportError::Io(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unready_connections_are_closed_and_retried() {
        let mut connector = FlakyConnector::new(2);
        connector.unready_failures = true;
        let closed = connector.closed.clone();
        let dialer = Dialer::new(connector, &config(3));

        dialer.dial("c:3").await.unwrap();
        assert_eq!(closed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_time_out() {
        let connector = FlakyConnector::new(0);
        connector.hang.store(true, Ordering::SeqCst);
        let dialer = Dialer::new(connector, &config(2));

        let err = dialer.dial("d:4").await.unwrap_err();
        assert!(matches!(err.source, TransportError::Timeout(d) if d == Duration::from_millis(100)));
        assert_eq!(err.attempts, 2);
    }
}
