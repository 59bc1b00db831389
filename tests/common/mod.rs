//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use rpc_pool::{Connection, Connector, HealthStatus, TransportError};

/// Scripted behaviour and counters for one fake backend.
#[derive(Debug)]
pub struct MockBackend {
    /// Dial attempts left to fail before dials succeed.
    pub failures_left: AtomicU32,
    /// Fail every dial.
    pub always_fail: AtomicBool,
    /// Dials succeed but hand back connections that are not ready.
    pub unready_dials: AtomicBool,
    /// Connections report ready only while this is set.
    pub transport_up: AtomicBool,
    /// Health checks answer Serving while set, NotServing otherwise.
    pub serving: AtomicBool,
    /// Health checks never answer.
    pub hang_health: AtomicBool,
    /// Closing a connection reports an error.
    pub fail_close: AtomicBool,

    pub dial_attempts: AtomicU32,
    pub opened: AtomicU32,
    pub closed: AtomicU32,
    pub health_checks: AtomicU32,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            failures_left: AtomicU32::new(0),
            always_fail: AtomicBool::new(false),
            unready_dials: AtomicBool::new(false),
            transport_up: AtomicBool::new(true),
            serving: AtomicBool::new(true),
            hang_health: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            dial_attempts: AtomicU32::new(0),
            opened: AtomicU32::new(0),
            closed: AtomicU32::new(0),
            health_checks: AtomicU32::new(0),
        }
    }
}

/// Connector over a fixed set of mock backends, keyed by address.
#[derive(Debug, Clone)]
pub struct MockConnector {
    backends: Arc<HashMap<String, Arc<MockBackend>>>,
}

impl MockConnector {
    pub fn new(addresses: &[&str]) -> Self {
        let backends = addresses
            .iter()
            .map(|a| (a.to_string(), Arc::new(MockBackend::default())))
            .collect();
        Self {
            backends: Arc::new(backends),
        }
    }

    pub fn backend(&self, address: &str) -> Arc<MockBackend> {
        self.backends[address].clone()
    }
}

impl Connector for MockConnector {
    type Conn = MockConn;

    async fn connect(&self, address: &str) -> Result<MockConn, TransportError> {
        let backend = self
            .backends
            .get(address)
            .cloned()
            .ok_or_else(|| TransportError::Protocol(format!("unknown address {}", address)))?;
        backend.dial_attempts.fetch_add(1, Ordering::SeqCst);

        let scripted_failure = backend
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if backend.always_fail.load(Ordering::SeqCst)
            || !backend.transport_up.load(Ordering::SeqCst)
            || scripted_failure
        {
            return Err(TransportError::Io(std::io::ErrorKind::ConnectionRefused.into()));
        }

        backend.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockConn {
            address: address.to_string(),
            ready: !backend.unready_dials.load(Ordering::SeqCst),
            backend,
            closed: AtomicBool::new(false),
        })
    }
}

#[derive(Debug)]
pub struct MockConn {
    pub address: String,
    ready: bool,
    backend: Arc<MockBackend>,
    closed: AtomicBool,
}

impl Connection for MockConn {
    fn is_ready(&self) -> bool {
        self.ready
            && !self.closed.load(Ordering::SeqCst)
            && self.backend.transport_up.load(Ordering::SeqCst)
    }

    async fn check_health(&self) -> Result<HealthStatus, TransportError> {
        self.backend.health_checks.fetch_add(1, Ordering::SeqCst);
        if self.backend.hang_health.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.backend.serving.load(Ordering::SeqCst) {
            Ok(HealthStatus::Serving)
        } else {
            Ok(HealthStatus::NotServing)
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.backend.closed.fetch_add(1, Ordering::SeqCst);
        if self.backend.fail_close.load(Ordering::SeqCst) {
            return Err(TransportError::Protocol("close failed".into()));
        }
        Ok(())
    }
}

/// Start an HTTP/1 backend on an ephemeral port. `/health` answers with the
/// status code currently stored in `health_status`; every other path is 200.
pub async fn start_http_backend(health_status: Arc<AtomicU16>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let health_status = health_status.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let health_status = health_status.clone();
                    async move {
                        let code = if req.uri().path() == "/health" {
                            health_status.load(Ordering::SeqCst)
                        } else {
                            200
                        };
                        let mut response = Response::new(format!("{} from {}", code, addr));
                        *response.status_mut() = StatusCode::from_u16(code).unwrap();
                        Ok::<_, Infallible>(response)
                    }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    addr
}

/// Start a backend that accepts TCP connections but never answers a request.
/// `accepted` counts connections.
pub async fn start_silent_backend(accepted: Arc<AtomicU32>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            held.push(stream);
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
