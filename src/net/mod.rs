//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, one task per connection)
//!     → tls.rs (optional TLS handshake, inside the task)
//!     → connection.rs (worker: drive HTTP/1.1 until close)
//!     → Hand off each request to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Workers share nothing mutable; each owns its stream exclusively
//! - Per-connection errors end that connection only
//! - TLS is optional and handled transparently

pub mod connection;
pub mod listener;
pub mod tls;

pub use connection::{ConnectionError, ConnectionId, Worker};
pub use listener::{Acceptor, ListenerError, RunningAcceptor};
