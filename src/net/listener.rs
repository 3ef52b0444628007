//! Connection acceptor.
//!
//! # Responsibilities
//! - Bind the listening socket (plain TCP or TLS)
//! - Accept incoming TCP connections
//! - Spawn one independent worker task per connection
//! - Stop cleanly on the shutdown signal, stop on accept errors
//!
//! # Design Decisions
//! - Fire-and-forget workers: the acceptor neither waits for nor tracks them
//! - No connection cap; every accepted socket gets a worker
//! - TLS handshakes run inside the worker task, never in the accept loop

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum_server::accept::Accept;
use axum_server::tls_rustls::RustlsAcceptor;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::{ListenerConfig, TransportKind};
use crate::http::ConnectionService;
use crate::lifecycle::Shutdown;
use crate::net::connection::Worker;
use crate::net::tls;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Certificate or key could not be loaded.
    #[error("Failed to load TLS material: {0}")]
    Tls(#[source] std::io::Error),

    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(#[source] std::io::Error),

    /// The accept loop task panicked or was aborted.
    #[error("Accept loop task failed: {0}")]
    Task(String),
}

/// How accepted sockets are wrapped before serving.
#[derive(Clone)]
enum Transport {
    Plain,
    Tls(RustlsAcceptor),
}

/// Owns the listening socket and hands each connection to a worker.
pub struct Acceptor {
    /// The underlying TCP listener.
    inner: TcpListener,
    transport: Transport,
    service: Arc<ConnectionService>,
}

impl Acceptor {
    /// Bind to the configured address, loading TLS material if configured.
    pub async fn bind(config: &ListenerConfig, service: Arc<ConnectionService>) -> Result<Self, ListenerError> {
        let address = config.bind_address();
        let ip: IpAddr = config.host.parse().map_err(|e| ListenerError::Bind {
            address: address.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
        })?;

        let transport = match &config.tls {
            Some(tls) => Transport::Tls(tls::acceptor_for(tls).await.map_err(ListenerError::Tls)?),
            None => Transport::Plain,
        };

        let inner = TcpListener::bind(SocketAddr::new(ip, config.port))
            .await
            .map_err(|source| ListenerError::Bind { address, source })?;

        Ok(Self {
            inner,
            transport,
            service,
        })
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    pub fn transport(&self) -> TransportKind {
        match self.transport {
            Transport::Plain => TransportKind::Plain,
            Transport::Tls(_) => TransportKind::Encrypted,
        }
    }

    /// Accept connections until shutdown is signalled or accepting fails.
    ///
    /// The listening socket is closed when this returns. Workers already
    /// running are left alone.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ListenerError> {
        if let Ok(addr) = self.inner.local_addr() {
            tracing::info!(address = %addr, transport = ?self.transport(), "Listening for connections");
        }

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Acceptor stopping");
                    return Ok(());
                }
                accepted = self.inner.accept() => match accepted {
                    Ok((stream, peer_addr)) => self.dispatch(stream, peer_addr),
                    Err(e) => {
                        tracing::error!(error = %e, "I/O error initialising connection");
                        return Err(ListenerError::Accept(e));
                    }
                },
            }
        }
    }

    fn dispatch(&self, stream: TcpStream, peer_addr: SocketAddr) {
        tracing::trace!(peer_addr = %peer_addr, "Connection accepted");
        let service = Arc::clone(&self.service);

        match &self.transport {
            Transport::Plain => {
                tokio::spawn(async move {
                    let _ = Worker::new(stream, peer_addr, service).run().await;
                });
            }
            Transport::Tls(acceptor) => {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    match acceptor.accept(stream, ()).await {
                        Ok((stream, ())) => {
                            let _ = Worker::new(stream, peer_addr, service).run().await;
                        }
                        Err(e) => {
                            tracing::debug!(peer_addr = %peer_addr, error = %e, "TLS handshake failed");
                        }
                    }
                });
            }
        }
    }

    /// Bind and run the accept loop on its own task.
    pub async fn start(config: &ListenerConfig, service: Arc<ConnectionService>) -> Result<RunningAcceptor, ListenerError> {
        let acceptor = Self::bind(config, service).await?;
        let local_addr = acceptor
            .local_addr()
            .map_err(|source| ListenerError::Bind {
                address: config.bind_address(),
                source,
            })?;
        let transport = acceptor.transport();

        let shutdown = Shutdown::new();
        let receiver = shutdown.subscribe();
        let task = tokio::spawn(acceptor.run(receiver));

        Ok(RunningAcceptor {
            local_addr,
            transport,
            shutdown,
            task,
        })
    }
}

/// Handle to an accept loop running on its own task.
pub struct RunningAcceptor {
    local_addr: SocketAddr,
    transport: TransportKind,
    shutdown: Shutdown,
    task: JoinHandle<Result<(), ListenerError>>,
}

impl RunningAcceptor {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    /// Wait for the accept loop to exit on its own.
    pub async fn wait(&mut self) -> Result<(), ListenerError> {
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) => Err(ListenerError::Task(e.to_string())),
        }
    }

    /// Stop accepting and release the listening socket.
    pub async fn stop(mut self) -> Result<(), ListenerError> {
        self.shutdown.trigger();
        self.wait().await
    }
}
