//! HttpCap: a diagnostic HTTP/1.1 server.
//!
//! Accepts connections, traces the structure of every request it receives
//! (request line, headers with their elements and parameters, body) and
//! answers each one with `200 OK`.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::CapConfig;
pub use lifecycle::{startup, Shutdown, StartupError};
pub use net::{Acceptor, RunningAcceptor};
