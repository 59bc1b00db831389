//! HTTP/1 transport built on hyper client connections.
//!
//! Each `HttpConnection` owns one TCP connection and the hyper task that
//! drives it. Health is a `GET` of the configured path; any 2xx answer counts
//! as serving.
//!
//! HTTP/1 carries one exchange at a time. An exchange whose future is dropped
//! before it completes (a caller timeout, say) leaves the connection waiting
//! on a response nobody reads, so the connection stops reporting ready.

use std::sync::atomic::{AtomicBool, Ordering};
use std::pin::pin;
use hyper::body::{Body, Incoming};
use hyper::client::conn::http1::{self, SendRequest};
use hyper::{header, Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::net::connection::{Connection, Connector, HealthStatus};

/// Dials plain HTTP/1 connections.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    options: TransportConfig,
}

impl HttpConnector {
    pub fn new(options: TransportConfig) -> Self {
        Self { options }
    }
}

impl Connector for HttpConnector {
    type Conn = HttpConnection;

    async fn connect(&self, address: &str) -> Result<HttpConnection, TransportError> {
        check_host_port(address)?;
        let stream = TcpStream::connect(address).await?;
        stream.set_nodelay(self.options.nodelay)?;

        let (sender, conn) = http1::handshake::<_, String>(TokioIo::new(stream)).await?;
        let addr = address.to_string();
        let driver = tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(address = %addr, error = %e, "HTTP connection terminated");
            }
        });

        tracing::trace!(address = %address, "HTTP connection established");
        Ok(HttpConnection {
            address: address.to_string(),
            options: self.options.clone(),
            sender: Mutex::new(sender),
            driver,
            closed: AtomicBool::new(false),
            abandoned: AtomicBool::new(false),
        })
    }
}

/// One HTTP/1 connection to a backend.
#[derive(Debug)]
pub struct HttpConnection {
    address: String,
    options: TransportConfig,
    sender: Mutex<SendRequest<String>>,
    driver: JoinHandle<()>,
    closed: AtomicBool,
    abandoned: AtomicBool,
}

impl HttpConnection {
    /// The address this connection was dialed to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send a request over this connection. Requests are serialized; HTTP/1
    /// carries one exchange at a time.
    ///
    /// The `Host` header is filled in when missing.
    pub async fn send(&self, mut request: Request<String>) -> Result<Response<Incoming>, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        if !request.headers().contains_key(header::HOST) {
            let host = header::HeaderValue::from_str(&self.address)
                .map_err(|e| TransportError::Protocol(e.to_string()))?;
            request.headers_mut().insert(header::HOST, host);
        }

        let mut sender = self.sender.lock().await;
        sender.ready().await?;
        let exchange = InFlight::new(&self.abandoned);
        let response = sender.send_request(request).await?;
        exchange.finish();
        Ok(response)
    }
}

impl Connection for HttpConnection {
    fn is_ready(&self) -> bool {
        if self.closed.load(Ordering::Acquire)
            || self.abandoned.load(Ordering::Acquire)
            || self.driver.is_finished()
        {
            return false;
        }
        // A held lock means an exchange is running; abandoned ones are caught above.
        match self.sender.try_lock() {
            Ok(sender) => !sender.is_closed(),
            Err(_) => true,
        }
    }

    async fn check_health(&self) -> Result<HealthStatus, TransportError> {
        let request = Request::builder()
            .method("GET")
            .uri(self.options.health_path.as_str())
            .header(header::USER_AGENT, self.options.user_agent.as_str())
            .body(String::new())
            .map_err(|e| TransportError::Protocol(e.to_string()))?;

        let response = self.send(request).await?;
        let status = response.status();

        // Drain the body so the connection can carry the next request.
        let draining = InFlight::new(&self.abandoned);
        let mut body = pin!(response.into_body());
        while let Some(frame) = std::future::poll_fn(|cx| body.as_mut().poll_frame(cx)).await {
            frame?;
        }
        draining.finish();

        if status.is_success() {
            Ok(HealthStatus::Serving)
        } else {
            tracing::debug!(address = %self.address, status = %status, "Health check returned non-success status");
            Ok(HealthStatus::NotServing)
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(TransportError::Closed);
        }
        self.driver.abort();
        Ok(())
    }
}

impl Drop for HttpConnection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// Flags the connection as abandoned unless the exchange runs to completion.
struct InFlight<'a> {
    abandoned: &'a AtomicBool,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(abandoned: &'a AtomicBool) -> Self {
        Self { abandoned, armed: true }
    }

    fn finish(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.abandoned.store(true, Ordering::Release);
        }
    }
}

/// The connector dials TCP directly, so it needs an explicit `host:port`.
fn check_host_port(address: &str) -> Result<(), TransportError> {
    let invalid = || TransportError::InvalidAddress(address.to_string());
    let (_, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    if address.contains('/') || port.parse::<u16>().is_err() {
        return Err(invalid());
    }
    // Url::port() hides default ports, so only the host comes from the parse.
    let url = Url::parse(&format!("http://{}", address)).map_err(|_| invalid())?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}
