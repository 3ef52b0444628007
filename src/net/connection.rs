//! Connection worker and lifecycle tracking.
//!
//! # Responsibilities
//! - Drive one accepted connection until the peer closes it or it fails
//! - Generate unique connection IDs for tracing
//! - Release the connection exactly once, whatever ended it
//! - Classify why a connection ended

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::http::{ConnectionService, ServiceError};

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why a connection stopped serving requests.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Peer ended the stream, possibly mid-request.
    #[error("connection closed by peer")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes on the wire were not a valid HTTP message.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The service failed while answering a request.
    #[error("service error: {0}")]
    Service(String),
}

impl ConnectionError {
    /// Map a connection driver failure onto the error taxonomy.
    pub fn classify(err: &hyper::Error) -> Self {
        if err.is_incomplete_message() || err.is_closed() || err.is_canceled() {
            return ConnectionError::Closed;
        }
        if err.is_parse() || err.is_parse_too_large() || err.is_parse_status() {
            return ConnectionError::Protocol(err.to_string());
        }

        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            if let Some(service) = cause.downcast_ref::<ServiceError>() {
                return ConnectionError::Service(service.to_string());
            }
            if let Some(io) = cause.downcast_ref::<std::io::Error>() {
                return ConnectionError::Io(std::io::Error::new(io.kind(), io.to_string()));
            }
            source = std::error::Error::source(cause);
        }

        if err.is_timeout() {
            return ConnectionError::Io(std::io::ErrorKind::TimedOut.into());
        }
        ConnectionError::Protocol(err.to_string())
    }

    /// Normal end of a connection rather than a failure.
    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionError::Closed)
    }
}

/// Guard that marks a connection's lifetime.
/// Logs the release when dropped, on every exit path.
#[derive(Debug)]
pub struct ConnectionGuard {
    id: ConnectionId,
    peer_addr: SocketAddr,
}

impl ConnectionGuard {
    pub fn new(peer_addr: SocketAddr) -> Self {
        Self {
            id: ConnectionId::new(),
            peer_addr,
        }
    }

    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        tracing::trace!(connection_id = %self.id, peer_addr = %self.peer_addr, "Connection released");
    }
}

/// Owns one accepted connection end to end.
pub struct Worker<IO> {
    io: IO,
    guard: ConnectionGuard,
    service: Arc<ConnectionService>,
}

impl<IO> Worker<IO>
where
    IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(io: IO, peer_addr: SocketAddr, service: Arc<ConnectionService>) -> Self {
        Self {
            io,
            guard: ConnectionGuard::new(peer_addr),
            service,
        }
    }

    /// Serve requests until the connection ends.
    ///
    /// The stream and the guard are dropped before this returns, so the
    /// connection is released exactly once even when serving fails. Aborting
    /// the task running this future releases it the same way.
    pub async fn run(self) -> Result<(), ConnectionError> {
        let Worker { io, guard, service } = self;
        tracing::debug!(connection_id = %guard.id(), peer_addr = %guard.peer_addr, "Connection opened");

        let svc = service_fn(move |request: Request<Incoming>| {
            let service = Arc::clone(&service);
            async move { service.handle_one(request).await }
        });

        let outcome = http1::Builder::new()
            .keep_alive(true)
            .title_case_headers(true)
            .serve_connection(TokioIo::new(io), svc)
            .await
            .map_err(|e| ConnectionError::classify(&e));

        match &outcome {
            Ok(()) => {
                tracing::debug!(connection_id = %guard.id, "Connection finished");
            }
            Err(e) if e.is_closed() => {
                tracing::debug!(connection_id = %guard.id, "Client closed connection");
            }
            Err(e) => {
                tracing::debug!(connection_id = %guard.id, error = %e, "Connection terminated");
            }
        }

        drop(guard);
        outcome
    }
}
