//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section falls back to its defaults, so an empty file is a valid
//! configuration.

use serde::Deserialize;

/// Port used when neither the config file nor the command line names one.
pub const DEFAULT_PORT: u16 = 8888;

/// Identity written into the `Server` response header by default.
pub const DEFAULT_SERVER_IDENTITY: &str = "HttpCap/1.1";

/// Root configuration for the capture server.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CapConfig {
    /// Listener configuration (address, port, TLS).
    pub listener: ListenerConfig,

    /// Response identity settings.
    pub server: ServerConfig,

    /// Where request traces are written.
    pub trace: TraceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port. Zero asks the OS for an ephemeral port.
    pub port: u16,

    /// Optional TLS configuration. Plain TCP when absent.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            tls: None,
        }
    }
}

impl ListenerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Transport selected by this configuration.
    pub fn transport(&self) -> TransportKind {
        match self.tls {
            Some(_) => TransportKind::Encrypted,
            None => TransportKind::Plain,
        }
    }
}

/// Transport flavour of the listening socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Plain,
    Encrypted,
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Response identity settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Value of the `Server` header.
    pub identity: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            identity: DEFAULT_SERVER_IDENTITY.to_string(),
        }
    }
}

/// Request trace settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TraceConfig {
    /// Sink receiving the per-request trace.
    pub output: TraceOutput,
}

/// Destination of request traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraceOutput {
    /// Plain lines on standard output.
    #[default]
    Stdout,
    /// One `tracing` event per request.
    Log,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
