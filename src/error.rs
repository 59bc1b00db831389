//! Error types surfaced by the pool.

use std::time::Duration;
use thiserror::Error;

pub use crate::config::ConfigError;

/// Failures reported by a transport implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP protocol failure.
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// The connector cannot interpret the address.
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    /// Operation did not finish before its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Connected, but the transport never reached a ready state.
    #[error("connection not ready")]
    NotReady,

    /// The connection has been closed.
    #[error("connection closed")]
    Closed,

    /// Unexpected or malformed exchange.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Every dial attempt for an address failed.
#[derive(Debug, Error)]
#[error("failed to dial {address} after {attempts} attempts: {source}")]
pub struct DialError {
    pub address: String,
    pub attempts: u32,
    #[source]
    pub source: TransportError,
}

/// Errors returned by pool construction and acquisition.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Invalid construction input. Never retried.
    #[error("invalid pool configuration: {0}")]
    Config(#[from] ConfigError),

    /// An endpoint could not be dialed during eager construction.
    #[error(transparent)]
    Dial(#[from] DialError),

    /// No endpoint could supply a usable connection.
    #[error("no healthy connections available")]
    NoHealthyConnections,
}

/// Connections that failed to close. Other connections were still closed.
#[derive(Debug)]
pub struct CloseError {
    pub failures: Vec<(String, TransportError)>,
}

impl std::fmt::Display for CloseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.failures.first() {
            Some((address, err)) => {
                write!(f, "failed to close connection to {}: {}", address, err)?;
                if self.failures.len() > 1 {
                    write!(f, " (and {} more)", self.failures.len() - 1)?;
                }
                Ok(())
            }
            None => write!(f, "failed to close connections"),
        }
    }
}

impl std::error::Error for CloseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures.first().map(|(_, err)| err as &(dyn std::error::Error + 'static))
    }
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dial_error_mentions_address_and_attempts() {
        let err = DialError {
            address: "10.0.0.7:50051".into(),
            attempts: 3,
            source: TransportError::Timeout(Duration::from_millis(200)),
        };
        let msg = err.to_string();
        assert!(msg.contains("10.0.0.7:50051"));
        assert!(msg.contains("3 attempts"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn close_error_shows_first_and_count() {
        let err = CloseError {
            failures: vec![
                ("a:1".into(), TransportError::Closed),
                ("b:2".into(), TransportError::NotReady),
                ("c:3".into(), TransportError::NotReady),
            ],
        };
        assert_eq!(
            err.to_string(),
            "failed to close connection to a:1: connection closed (and 2 more)"
        );
    }
}
